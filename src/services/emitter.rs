use crate::error::{CaptureError, Result};
use crate::events::KeyRecord;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

/// Форматтер JSON с пробелом после `:` и после `,`:
/// `{"key_name": "A", "key_code": 30}`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Сериализовать запись в одну строку с завершающим `\n`
pub fn format_line(record: &KeyRecord, buf: &mut Vec<u8>) -> io::Result<()> {
    let mut serializer = Serializer::with_formatter(&mut *buf, SpacedFormatter);
    record.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(())
}

/// Пишет по одной строке на запись в выходной поток
pub struct Emitter<W: Write> {
    out: W,
    line: Vec<u8>,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: Vec::with_capacity(64),
        }
    }

    /// Записать строку и сразу сбросить буфер, чтобы потребитель видел нажатие без задержки
    pub fn emit(&mut self, record: &KeyRecord) -> Result<()> {
        self.line.clear();
        format_line(record, &mut self.line).map_err(CaptureError::Emission)?;

        self.out
            .write_all(&self.line)
            .and_then(|()| self.out.flush())
            .map_err(CaptureError::Emission)
    }
}
