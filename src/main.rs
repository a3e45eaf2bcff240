use clap::{App, Arg};
use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg};
use std::process;

fn main() {
    let matches = App::new("lc3sim")
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Runs in debug mode"),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .takes_value(true)
                .possible_values(&["hex", "binary"])
                .help("Program image format; sniffed from the file extension if omitted"),
        )
        .arg(
            Arg::with_name("PROGRAM")
                .help("The program to run.")
                .required(true)
                .index(1),
        )
        .get_matches();

    disable_input_buffering();

    let format = matches.value_of("format").map(|value| match value {
        "hex" => lc3sim::Format::Hex,
        "binary" => lc3sim::Format::Binary,
        _ => unreachable!("clap restricts this to hex/binary"),
    });

    let config = lc3sim::Config {
        filename: matches.value_of("PROGRAM").unwrap().to_string(),
        debug: matches.is_present("debug"),
        format,
    };

    if let Err(e) = lc3sim::run(config) {
        println!("Application error: {}", e);
        process::exit(1);
    }
}

fn disable_input_buffering() {
    const STDIN_FILENO: i32 = 0;

    let mut termios = tcgetattr(STDIN_FILENO).unwrap_or_else(|err| {
        println!("An error occured: {}", err);
        process::exit(1);
    });
    termios.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO);

    tcsetattr(0, SetArg::TCSANOW, &termios).unwrap_or_else(|err| {
        println!("An error occured: {}", err);
        process::exit(1);
    });
}
