//! The fixed-point parse loop.
//!
//! Each round injects the default of every pending selector the user did not
//! name, then runs one pass over the remaining tokens with the flags known at
//! the start of that pass. Selecting a type registers new flags, which only
//! become recognizable in the next round, so tokens for them simply wait.
//! The loop ends once no tokens and no pending selectors are left, or when a
//! round leaves the token list unchanged.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{ConfigError, Suggestion};
use crate::grammar::{Grammar, Nargs};
use crate::suggest;

/// A flag token starts with `--` and names something; `-13` is a value.
pub(crate) fn is_flag(token: &str) -> bool {
    token.len() > 2 && token.starts_with("--")
}

fn flag_name(token: &str) -> Option<&str> {
    is_flag(token).then(|| &token[2..])
}

/// Split `--flag=value` into `--flag value`.
pub(crate) fn split_assignments<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((flag, value)) if is_flag(flag) => {
                out.push(flag.to_string());
                out.push(value.to_string());
            }
            _ => out.push(arg.to_string()),
        }
    }
    out
}

/// Run rounds until the grammar stops changing. Returns the tokens nobody
/// recognized.
pub(crate) fn run<S: AsRef<str>>(
    grammar: &mut Grammar<'_>,
    input: &[S],
) -> Result<Vec<String>, ConfigError> {
    let mut args = split_assignments(input);
    let explicit: HashSet<String> = args
        .iter()
        .filter_map(|token| flag_name(token))
        .map(str::to_string)
        .collect();

    let mut round = 0usize;
    while !args.is_empty() || !grammar.pending.is_empty() {
        round += 1;
        let pending = std::mem::take(&mut grammar.pending);
        debug!(round, pending = pending.len(), "injecting defaults");
        for (flag, entry) in pending {
            if explicit.contains(&flag) {
                continue;
            }
            match entry.synthesize(grammar.registry()) {
                Some(tokens) => {
                    trace!(flag = %flag, ?tokens, "injecting default");
                    args.push(format!("--{flag}"));
                    args.extend(tokens);
                }
                None => {
                    grammar.unresolved.insert(flag, entry);
                }
            }
        }

        debug!(round, remaining = ?args, "parse pass");
        let before = args.clone();
        args = pass(grammar, args)?;
        if args == before {
            break;
        }
    }
    debug!(rounds = round, flags = grammar.flags.len(), "parse converged");
    Ok(args)
}

/// One pass over `args` with the flags registered before the pass began.
fn pass(grammar: &mut Grammar<'_>, args: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let known: HashSet<String> = grammar.flags.keys().cloned().collect();
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let recognized = flag_name(&args[i])
            .filter(|name| known.contains(*name))
            .and_then(|name| grammar.nargs(name).map(|nargs| (name, nargs)));
        let Some((name, nargs)) = recognized else {
            rest.push(args[i].clone());
            i += 1;
            continue;
        };

        let start = i + 1;
        let end = match nargs {
            Nargs::One => {
                if start >= args.len() || is_flag(&args[start]) {
                    return Err(ConfigError::invalid(name, "expected one value"));
                }
                start + 1
            }
            Nargs::Many => args[start..]
                .iter()
                .position(|token| is_flag(token))
                .map_or(args.len(), |offset| start + offset),
        };
        grammar.apply(name, &args[start..end])?;
        i = end;
    }
    Ok(rest)
}

/// Report tokens left after convergence, with the nearest known flags.
pub(crate) fn unknown_arguments<'a>(
    leftovers: Vec<String>,
    known: impl IntoIterator<Item = &'a str> + Clone,
) -> ConfigError {
    let suggestions = leftovers
        .iter()
        .filter(|token| is_flag(token))
        .map(|token| Suggestion {
            arg: token.clone(),
            alternatives: suggest::nearest(token, known.clone()),
        })
        .collect();
    ConfigError::UnknownArgument {
        args: leftovers,
        suggestions,
    }
}
