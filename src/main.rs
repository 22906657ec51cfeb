fn main() -> Result<(), Box<dyn std::error::Error>> {
    extshift::cli::main()
}
