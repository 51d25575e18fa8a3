fn main() {
    if let Err(e) = myco_reminders_lib::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
