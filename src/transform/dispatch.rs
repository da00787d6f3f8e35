//! Invoke a plugin and settle its answer into one [`TransformOutput`]

use super::completion::Completion;
use super::output::{normalize, TransformOutput};
use super::plugin::{PluginReturn, TransformContext, TransformInput};
use super::TransformSpec;
use crate::error::{WatchStoreError, WatchStoreResult};
use tracing::{debug, error};

/// Run `spec`'s plugin on `input`
///
/// Whichever of the direct value, the deferred future or the completion
/// callback signals first is the result. There is no timeout: a plugin
/// that returns `Pending` and keeps its completion alive without signalling
/// never finishes.
pub async fn invoke(
    spec: &TransformSpec,
    input: TransformInput,
    ctx: TransformContext,
) -> WatchStoreResult<TransformOutput> {
    let path = ctx.path.clone();
    if let Some(name) = &spec.name {
        debug!("Apply transform plugin {} to {}", name, path.display());
    }

    let (done, rx) = Completion::channel(&path);

    match spec.plugin.transform(input, &ctx, done.clone()) {
        Ok(PluginReturn::Value(output)) => {
            done.complete(Ok(output));
        }
        Ok(PluginReturn::Deferred(fut)) => {
            let done = done.clone();
            tokio::spawn(async move {
                done.complete(fut.await);
            });
        }
        Ok(PluginReturn::Pending) => {}
        Err(e) => {
            done.complete(Err(e));
        }
    }
    drop(done);

    match rx.await {
        Ok(Ok(raw)) => Ok(normalize(raw, &path)),
        Ok(Err(e)) => {
            error!("Error while transform of {}: {}", path.display(), e);
            Err(WatchStoreError::transform(&path, e.to_string()))
        }
        Err(_) => {
            error!("Transform of {} ended without a result", path.display());
            Err(WatchStoreError::transform(
                &path,
                "plugin dropped its completion without signalling",
            ))
        }
    }
}
