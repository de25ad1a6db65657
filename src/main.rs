use rjackc::CodeWriter;
use std::env;
use std::process;

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("rjackc");
    eprintln!("usage: {program} <file.jack>");
    process::exit(1);
  }

  let source = match std::fs::read_to_string(&args[1]) {
    Ok(text) => text,
    Err(err) => {
      eprintln!("failed to read '{}': {err}", args[1]);
      process::exit(1);
    }
  };

  let mut writer = CodeWriter::new();
  match rjackc::compile_with(&mut writer, &source) {
    Ok(()) => {
      for line in writer.code() {
        println!("{line}");
      }
    }
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
