fn main() {
    lalrpop::Configuration::new()
        .use_cargo_dir_conventions()
        .process()
        .expect("failed to generate parser from grammar.lalrpop");
}
