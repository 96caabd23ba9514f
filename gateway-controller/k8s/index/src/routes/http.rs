use anyhow::{anyhow, bail, Result};
use linkerd_gateway_controller_core::http_route as core;
use linkerd_gateway_controller_k8s_api as api;

pub fn try_match(
    api::HttpRouteMatch {
        path,
        headers,
        query_params,
        method,
    }: api::HttpRouteMatch,
) -> Result<core::HttpRouteMatch> {
    let path = path.map(path_match).transpose()?;

    let headers = headers
        .into_iter()
        .flatten()
        .map(header_match)
        .collect::<Result<_>>()?;

    let query_params = query_params
        .into_iter()
        .flatten()
        .map(query_param_match)
        .collect::<Result<_>>()?;

    let method = method
        .as_deref()
        .map(core::Method::try_from)
        .transpose()?;

    Ok(core::HttpRouteMatch {
        path,
        headers,
        query_params,
        method,
    })
}

pub fn path_match(api::HttpPathMatch { r#type, value }: api::HttpPathMatch) -> Result<core::PathMatch> {
    let value = value.unwrap_or_else(|| "/".to_string());
    match r#type.as_deref().unwrap_or("PathPrefix") {
        "Exact" | "PathPrefix" if !value.starts_with('/') => Err(anyhow!(
            "HttpPathMatch paths must be absolute (begin with `/`); {value:?} is not an absolute path"
        )),
        "Exact" => Ok(core::PathMatch::Exact(value)),
        "PathPrefix" => Ok(core::PathMatch::Prefix(value)),
        "RegularExpression" => core::PathMatch::regex(&value),
        other => bail!("unsupported path match type {other:?}"),
    }
}

pub fn header_match(
    api::HttpHeaderMatch {
        r#type,
        name,
        value,
    }: api::HttpHeaderMatch,
) -> Result<core::HeaderMatch> {
    match r#type.as_deref().unwrap_or("Exact") {
        "Exact" => Ok(core::HeaderMatch::Exact(name.parse()?, value.parse()?)),
        "RegularExpression" => Ok(core::HeaderMatch::Regex(name.parse()?, value.parse()?)),
        other => bail!("unsupported header match type {other:?}"),
    }
}

pub fn query_param_match(
    api::HttpQueryParamMatch {
        r#type,
        name,
        value,
    }: api::HttpQueryParamMatch,
) -> Result<core::QueryParamMatch> {
    match r#type.as_deref().unwrap_or("Exact") {
        "Exact" => Ok(core::QueryParamMatch::Exact(name, value)),
        "RegularExpression" => Ok(core::QueryParamMatch::Regex(name, value.parse()?)),
        other => bail!("unsupported query parameter match type {other:?}"),
    }
}
