fn main() {
    if let Err(e) = paperize_lib::run() {
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}
