pub fn cmd_version() {
  println!("{}", env!("CARGO_PKG_VERSION"));
}
