fn main() {
    if let Err(e) = palpiteiro_lib::run() {
        eprintln!("palpiteiro: {e}");
        std::process::exit(1);
    }
}
