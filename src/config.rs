use crate::loader::Format;

#[derive(Debug, PartialEq)]
pub struct Config {
    pub filename: String,
    pub debug: bool,
    pub format: Option<Format>,
}

impl Config {
    /// Parses a plain argument list (`program_name filename [--debug] [--format hex|binary]`).
    pub fn with(args: &[String]) -> Result<Self, &'static str> {
        if args.len() < 2 {
            return Err("not enough arguments");
        }

        let mut config = Self {
            filename: String::new(),
            debug: false,
            format: None,
        };

        let mut iter = args.iter().skip(1).peekable();
        while let Some(arg) = iter.next() {
            if arg == "--debug" {
                config.debug = true;
            } else if arg == "--format" {
                let value = iter.next().ok_or("--format requires a value")?;
                config.format = Some(match value.as_str() {
                    "hex" => Format::Hex,
                    "binary" => Format::Binary,
                    _ => return Err("--format must be \"hex\" or \"binary\""),
                });
            } else {
                config.filename = arg.clone();
            }
        }

        if config.filename.is_empty() {
            return Err("not enough arguments");
        }

        Ok(config)
    }

    /// The format to load with: explicit `--format`, else sniffed from
    /// the filename's extension.
    pub fn format(&self) -> Format {
        self.format.unwrap_or_else(|| Format::from_extension(&self.filename))
    }
}
