#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod report;

pub use self::{
    args::{Args, LogFormat, OutputFormat},
    report::Report,
};
pub use linkerd_gateway_controller_core as core;
pub use linkerd_gateway_controller_k8s_api as k8s;
pub use linkerd_gateway_controller_k8s_index as index;
pub use linkerd_gateway_controller_k8s_status as status;
