fn main() -> anyhow::Result<()> {
    flow_vignette::demos::run_demo("torus_solid")
}
