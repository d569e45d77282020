//! Command handlers, each returning the JSON document to print

use anyhow::Context;
use serde_json::{json, Value};

use crate::domain::DomainError;
use crate::infrastructure::services::ClearTarget;
use crate::AppContext;

use super::{ClearArgs, TokenArgs};

pub async fn status(context: &AppContext) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(context.wechat.get_cache_stats())?)
}

pub async fn flush(context: &AppContext) -> anyhow::Result<Value> {
    let flushed = context.cache.flush().await;
    Ok(json!({ "flushed": flushed }))
}

/// Upstream application errors are returned as WeChat's own payload
pub async fn token(context: &AppContext, args: &TokenArgs) -> anyhow::Result<Value> {
    match context
        .wechat
        .get_or_refresh_access_token(&args.appid, &args.secret)
        .await
    {
        Ok(token) => Ok(serde_json::to_value(token)?),
        Err(DomainError::Upstream { payload, .. }) => Ok(payload),
        Err(e) => Err(e).context("failed to obtain access token"),
    }
}

pub async fn clear(context: &AppContext, args: &ClearArgs) -> anyhow::Result<Value> {
    let target = ClearTarget::parse(&args.kind, args.appid.as_deref(), args.media_id.as_deref())?;
    let cleared = context.wechat.clear(target).await?;

    Ok(json!({ "type": args.kind, "cleared": cleared }))
}
