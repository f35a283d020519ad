fn main() {
    env_logger::init();

    let result = micrec::run();
    if let Err(err) = &result {
        eprintln!("Error occurred: {}", err);
    }

    std::process::exit(micrec::exit_code(&result));
}
