use colored::Colorize;
use std::fmt::Display;
use std::io::BufWriter;
use std::io::Stdout;
use std::io::Write;

pub struct Printer {
    first_title: bool,
    writer: BufWriter<Stdout>,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            first_title: true,
            writer: BufWriter::new(std::io::stdout()),
        }
    }

    pub fn title(&mut self, title: &str) {
        let newline = if !self.first_title {
            "\n"
        } else {
            self.first_title = false;
            ""
        };
        let _ = writeln!(self.writer, "{}{}", newline, title.bold().underline());
    }

    pub fn kv<V: Display>(&mut self, key: &str, value: V) {
        let _ = writeln!(self.writer, "  {}: {}", key.bold().blue(), value);
    }

    pub fn ok<V: Display>(&mut self, value: V) {
        let _ = writeln!(self.writer, "{} {}", "ok".bold().green(), value);
    }

    pub fn failed<V: Display>(&mut self, value: V) {
        let _ = writeln!(self.writer, "{} {}", "failed".bold().red(), value);
    }

    pub fn line<V: Display>(&mut self, value: V) {
        let _ = writeln!(self.writer, "{}", value);
    }

    pub fn flush(&mut self) -> Result<(), std::io::Error> {
        self.writer.flush()
    }
}
