#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

fn main() -> anyhow::Result<()> {
    linkerd_gateway_controller::Args::parse_and_run()
}
