//! Hierarchical, polymorphic configuration from the command line. Declare
//! your schemas, name a root, and parse.
//!
//! Polyflag derives a command-line grammar from a registry of schemas. A
//! structured field is not a fixed shape: the user picks its concrete type on
//! the command line, and the flags of that type become available in the same
//! invocation.
//!
//! ```ignore
//! let parser = Polyflag::builder(registry)
//!     .root("model", "Model")
//!     .build()?;
//! let ns = parser.parse(&["--model.encoder", "Transformer", "--model.encoder.layers", "6"])?;
//! let model: Model = ns.get("model")?;
//! ```
//!
//! That call selects `Transformer` for the `encoder` field, exposes
//! `--model.encoder.layers`, fills every other field from its default, and
//! hands you a typed value.
//!
//! # Why polyflag
//!
//! Flat flag parsers need every option declared up front. Applications whose
//! configuration is a tree of interchangeable components (a model with a
//! pluggable encoder, a pipeline with a list of stages) end up either with a
//! flag for every option of every implementation, or with hand-written
//! dispatch code per component.
//!
//! Polyflag replaces that with schemas. Each schema lists its fields, their
//! defaults and documentation, and which schema it extends. A field declared
//! with a base schema accepts any of its subtypes. The flag set grows and
//! shrinks as types are selected.
//!
//! # Design: schemas as source of truth
//!
//! A [`Schema`] is a plain value registered in a [`Registry`]:
//!
//! - **[`Field`]** gives each field a [`TypeExpr`] (primitive, enum, record,
//!   optional, list, set, dict, or a bounded type parameter) and a default.
//! - **[`FieldMeta`]** carries the help text, the path separator, the
//!   [`Mode`] that shapes the flag path, choice lists, and the flags
//!   `required`, `fix_type` and `disable_subclass_check`.
//! - **`extends`** sets the subtype relation. Inherited fields come first;
//!   a redeclared field replaces the inherited one in place.
//!
//! [`Registry::register`] rejects malformed schemas as they are added, and
//! [`ParserBuilder::build`] runs [`Registry::validate`] for everything that
//! depends on more than one schema.
//!
//! # How parsing works
//!
//! ```text
//! root selector ──inject default──▶ type chosen ──expand──▶ new flags
//!        ▲                                                    │
//!        └──────────── next pass sees the new flags ◀─────────┘
//! ```
//!
//! Every structured field registers a *selector* flag that is pending until
//! the user names a type or the parser injects the default. Selecting a type
//! registers that type's flags, which only become recognizable on the next
//! pass. The parser repeats until nothing is pending and nothing changes.
//! Flags for a sub-tree may therefore appear before the flag selecting it.
//!
//! Unresolved leaves then receive defaults, bottom up: the field's own
//! default, or the matching field of the enclosing default instance when
//! the selected type is a subtype of that instance's type. Missing required
//! fields are collected across the whole tree and reported together.
//!
//! # Values
//!
//! Resolved values are [`serde_json::Value`]s. A record is an object whose
//! `"__cls__"` entry ([`TYPE_TAG`]) names its schema. [`Namespace::get`]
//! deserializes a root into any `Deserialize` type; polymorphic fields map
//! to `#[serde(tag = "__cls__")]` enums. Default instances go the other way
//! through [`RootSpec::default_instance`], so a value survives
//! serialize-then-parse unchanged.
//!
//! # Flag paths
//!
//! | Declaration | Flags |
//! |-------------|-------|
//! | root `m`, field `enc` | `--m.enc`, `--m.enc.layers` |
//! | separator `/` on `enc` | `--m/enc`, `--m/enc.layers` |
//! | `Mode::Flat` on leaf `lr` | `--lr` |
//! | `Mode::Flat` on record `enc` | `--m.enc`, `--layers` |
//! | `Mode::SSnake` on record `enc` | `--enc`, `--enc.layers` |
//! | list of records `stages` | `--m.stages A B`, `--m.stages.1.x` |
//! | dict of records `heads` | `--m.heads a b=pkg:Head`, `--m.heads.a.x` |
//!
//! `Mode::Ignore` keeps a field off the command line entirely. Root ignore
//! lists ([`RootSpec::ignore`]) hide individual paths or whole sub-trees.
//!
//! # No CLI framework required
//!
//! The core has **no dependency on any CLI framework**: it takes a slice of
//! tokens. For [clap](https://docs.rs/clap) users, the `cli` module (behind
//! the `clap` Cargo feature, on by default) provides [`ResolveArgs`], which
//! collects the tokens and a `--show-config` switch and converts them into a
//! [`ResolveAction`] for [`TreeParser::handle`]. To use polyflag without clap:
//!
//! ```toml
//! polyflag = { version = "...", default-features = false }
//! ```
//!
//! # Sharing flags between parsers
//!
//! Parsers built with the same [`FlagCollector`] publish their flags to it,
//! and "did you mean" suggestions for an unknown flag are drawn from all of
//! them. Values are never shared.
//!
//! # Logging
//!
//! Parse passes and type selections are logged through
//! [`tracing`](https://docs.rs/tracing) at `debug`, every registered flag
//! and injected default at `trace`. Install a subscriber to see them.
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]. [`ConfigError::kind`]
//! groups the variants into schema errors, missing required arguments,
//! invalid choices, unknown arguments and type errors. See the [`error`]
//! module for the full set.

pub mod error;
pub mod types;

mod builder;
mod cascade;
#[cfg(feature = "clap")]
mod cli;
mod coerce;
mod describe;
mod driver;
mod flatten;
mod grammar;
pub(crate) mod merge;
mod namespace;
mod schema;
mod suggest;
mod tree;

#[cfg(test)]
mod fixtures;

pub use builder::{FlagCollector, ParserBuilder, Polyflag, RootSpec, TreeParser};
#[cfg(feature = "clap")]
pub use cli::ResolveArgs;
pub use describe::{Element, FieldDescriptor, describe};
pub use error::{ConfigError, ErrorKind, Suggestion};
pub use namespace::{Listing, Namespace, ResolveResult};
pub use schema::{Field, FieldDefault, FieldMeta, Registry, Schema};
pub use types::{
    Choices, ContainerKind, DEFAULT_SEPARATOR, EnumRepr, EnumSpec, Mode, Primitive, ResolveAction,
    SEPARATORS, TYPE_TAG, TypeExpr,
};
