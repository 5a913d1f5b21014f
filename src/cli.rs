//! Clap adapter for polyflag.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! The flags polyflag resolves are not known until the schema tree has been
//! walked, so clap can not parse them. [`ResolveArgs`] hands them over
//! verbatim instead, and [`ResolveArgs::into_action()`] converts the result
//! into a framework-agnostic [`ResolveAction`](crate::ResolveAction) for
//! [`TreeParser::handle()`](crate::TreeParser::handle).

use clap::Args;

use crate::types::ResolveAction;

/// Clap-derived args that collect every configuration flag.
///
/// Flatten this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     resolve: ResolveArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Print every resolved key and value instead of running.
    #[arg(long)]
    pub show_config: bool,

    /// Configuration flags, e.g. `--root.child Child2 --root.child.p2 1.5`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,
}

impl ResolveArgs {
    pub fn into_action(self) -> ResolveAction {
        if self.show_config {
            ResolveAction::Show {
                tokens: self.params,
            }
        } else {
            ResolveAction::Resolve {
                tokens: self.params,
            }
        }
    }
}
