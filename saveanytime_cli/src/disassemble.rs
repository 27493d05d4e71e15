use colored::{ColoredString, Colorize};
use iced_x86::{
    Decoder, DecoderOptions, Formatter, FormatterOutput, FormatterTextKind, IntelFormatter,
};
use itertools::Itertools;

#[derive(Default)]
struct Output {
    pub buffer: String,
}

impl FormatterOutput for Output {
    fn write(&mut self, text: &str, kind: FormatterTextKind) {
        #[allow(clippy::unnecessary_to_owned)]
        self.buffer.push_str(&get_color(text, kind).to_string());
    }
}

/// Disassemble `data` as x86-64 using file `offset` as the instruction pointer. Bytes that
/// differ from `reference` are highlighted.
pub(crate) fn disassemble(offset: u64, data: &[u8], reference: Option<&[u8]>) -> String {
    let mut output = Output::default();

    let mut formatter = IntelFormatter::new();
    formatter.options_mut().set_first_operand_char_index(8);
    for instruction in Decoder::with_ip(64, data, offset, DecoderOptions::NONE) {
        output
            .buffer
            .push_str(&format!("{:016x}:  ", instruction.ip()));

        let index = (instruction.ip() - offset) as usize;
        let bytes = data[index..index + instruction.len()]
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let changed = reference
                    .and_then(|reference| reference.get(index + i))
                    .is_some_and(|r| r != b);
                let s = format!("{b:02x}");
                if changed {
                    s.bright_white().reversed()
                } else {
                    s.bright_black()
                }
            })
            .join(" ");
        output.buffer.push_str(&bytes);
        output.buffer.push(' ');

        for _ in 0..8usize.saturating_sub(instruction.len()) {
            output.buffer.push_str("   ");
        }

        formatter.format(&instruction, &mut output);
        output.buffer.push('\n');
    }
    output.buffer
}

fn get_color(s: &str, kind: FormatterTextKind) -> ColoredString {
    match kind {
        FormatterTextKind::Directive | FormatterTextKind::Keyword => s.bright_yellow(),
        FormatterTextKind::Prefix | FormatterTextKind::Mnemonic => s.bright_red(),
        FormatterTextKind::Register => s.bright_blue(),
        FormatterTextKind::Number => s.bright_cyan(),
        _ => s.white(),
    }
}
