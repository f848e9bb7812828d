use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A text format that can be read into and written from a document type.
///
/// Formats that need context (the model describing an input deck, the unit
/// registry used to interpret a table header) carry it in `self`.
pub trait DataFile {
    /// The in-memory representation of one file.
    type Data;

    type Error: Error + From<io::Error>;

    fn read_from(&self, reader: &mut impl BufRead) -> Result<Self::Data, Self::Error>;

    fn write_to(&self, data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Self::Data, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(&self, data: &Self::Data, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(data, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Renders `data` into a string.
    fn write_to_string(&self, data: &Self::Data) -> Result<String, Self::Error> {
        let mut buffer = Vec::new();
        self.write_to(data, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    fn read_from_str(&self, text: &str) -> Result<Self::Data, Self::Error> {
        let mut reader = text.as_bytes();
        self.read_from(&mut reader)
    }
}
