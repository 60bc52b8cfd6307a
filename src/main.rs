fn main() -> anyhow::Result<()> {
    pokedex_lib::run()
}
