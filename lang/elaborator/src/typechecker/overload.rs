//! Overload resolution by trial typechecking.
//!
//! A call target names a set of scope layers of candidate symbols. Each
//! candidate of the innermost layer is tried speculatively against a
//! snapshot of the typer state; exactly one success commits its
//! post-state, several successes are ambiguous, none falls through to the
//! next layer. Diagnostics of failed trials never leak into the
//! committed state.

use log::trace;
use miette_util::ToMiette;

use ast::source::*;
use ast::*;
use printer::Print;

use super::ctx::Ctx;
use super::exprs::call::check_call_to;
use crate::result::{TcResult, TypeError};

pub fn resolve(
    ctx: &mut Ctx,
    call: &CallExpr,
    target: &IdTarget,
    expected: Option<&ValueType>,
) -> TcResult<CallExpr> {
    // A previous run has already settled this call.
    if let Some(resolved) = &target.resolved {
        return check_call_to(ctx, call, resolved, expected);
    }

    let snapshot = ctx.backup();
    let mut failures: Vec<(Symbol, TypeError)> = Vec::new();

    for layer in &target.layers {
        // Deterministic trial order, so diagnostics and resolution are
        // stable across runs.
        let mut layer = layer.clone();
        layer.sort();

        let mut successes = Vec::new();
        for candidate in layer {
            ctx.restore(snapshot.clone());
            trace!("trying overload candidate {}", candidate.name.id);
            match check_call_to(ctx, call, &candidate, expected) {
                Ok(out) => successes.push((candidate, out, ctx.backup())),
                Err(error) => failures.push((candidate, *error)),
            }
        }

        match successes.len() {
            0 => continue,
            1 => {
                let (candidate, out, post_state) = successes.into_iter().next().unwrap();
                trace!("committing overload candidate {}", candidate.name.id);
                ctx.restore(post_state);
                return Ok(out);
            }
            _ => {
                let candidates = successes
                    .iter()
                    .map(|(candidate, _, _)| match ctx.lookup_function_type(candidate, None) {
                        Ok(ft) => format!("  {}: {}", candidate.name.id, ft.print_trace()),
                        Err(_) => format!("  {}", candidate.name.id),
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                ctx.restore(snapshot);
                return Err(Box::new(TypeError::Ambiguous {
                    name: target.name.id.clone(),
                    candidates,
                    span: call.span.to_miette(),
                }));
            }
        }
    }

    // All layers exhausted without a unique success.
    ctx.restore(snapshot);
    match failures.len() {
        0 => Err(Box::new(TypeError::ResolutionError {
            name: target.name.id.clone(),
            span: call.span.to_miette(),
        })),
        1 => {
            // A single failing candidate: surface its diagnostics
            // verbatim.
            let (_, error) = failures.into_iter().next().unwrap();
            Err(Box::new(error))
        }
        _ => {
            let details = failures
                .iter()
                .map(|(candidate, error)| {
                    format!("Possible overload {}:\n  {}", candidate.name.id, error)
                })
                .collect::<Vec<_>>()
                .join("\n");
            Err(Box::new(TypeError::NoMatchingOverload {
                name: target.name.id.clone(),
                details,
                span: call.span.to_miette(),
            }))
        }
    }
}
