//! Procedural macros for Lectern.
//!
//! - `#[controller]` - Turn an inherent `impl` block into a `Controller`

use proc_macro::TokenStream;

mod controller;

/// Generate a `Controller` implementation from an `impl` block.
///
/// Every `pub` method taking `(&self, &ActionRequest)` and returning
/// `ActionResult<T>` becomes an action named after the method. Methods may be
/// `async` or not. Private methods and methods without a receiver are left
/// alone.
///
/// # Arguments
///
/// - `name = "main"` - the controller name used for responder hooks
///   (`main_<action>`). Defaults to the type name, lowercased, without a
///   trailing `Controller`.
/// - `output = Type` - the action output type. Inferred from the first
///   action's return type when omitted.
/// - `protected = [display, feed]` - methods that must never be reachable as
///   actions, even though they are `pub`.
///
/// # Example
///
/// ```rust,ignore
/// use lectern::prelude::*;
///
/// struct MainController;
///
/// #[controller(output = String, protected = [display])]
/// impl MainController {
///     pub async fn index(&self, request: &ActionRequest) -> ActionResult<String> {
///         Ok(format!("page {}", request.page("page").unwrap_or(1)))
///     }
///
///     pub fn display(&self, _request: &ActionRequest) -> ActionResult<String> {
///         Ok(String::new())
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::expand(attr, item)
}
