fn main() -> anyhow::Result<()> {
    dataqa_lib::run()
}
