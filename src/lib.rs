// csvrows - Streaming CSV row reader with typed cells
//
// Layers:
// core:   lookahead buffer, char decoding, delimiter, column state machine
// reader: sources, row reader lifecycle (open/next/reset/close), typed rows
// NIFs:   the row reader exposed to Elixir as a resource (this file)

use rustler::{Atom, Binary, Env, Error, NifResult, ResourceArc, Term};
use std::path::PathBuf;

pub mod core;
pub mod error;
pub mod reader;
mod resource;
mod term;

pub use crate::core::Delimiter;
pub use error::CsvError;
pub use reader::{to_display_text, CsvParser, MemorySource, ReaderOptions, Row, RowReader, Source};

use encoding_rs::Encoding;
use resource::{RowReaderRef, RowReaderResource};
use term::rows_to_term;

mod atoms {
    rustler::atoms! {
        ok,
    }
}

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Option decoding
// ============================================================================

/// Decode delimiter from a Term.
/// Accepts: integer 44 or 9, binary "," or "\t", or atom :comma / :tab
fn decode_delimiter(term: Term) -> NifResult<Delimiter> {
    if let Ok(byte) = term.decode::<u8>() {
        return Delimiter::from_byte(byte).ok_or(Error::BadArg);
    }
    if let Ok(binary) = term.decode::<Binary>() {
        let text = std::str::from_utf8(binary.as_slice()).map_err(|_| Error::BadArg)?;
        return text.parse().map_err(|_| Error::BadArg);
    }
    if let Ok(name) = term.atom_to_string() {
        return name.parse().map_err(|_| Error::BadArg);
    }
    Err(Error::BadArg)
}

/// Decode encoding from a Term.
/// Accepts a WHATWG label as binary ("utf-8", "shift_jis") or atom (:utf8)
fn decode_encoding(term: Term) -> NifResult<&'static Encoding> {
    let label = if let Ok(binary) = term.decode::<Binary>() {
        binary.as_slice().to_vec()
    } else if let Ok(name) = term.atom_to_string() {
        name.into_bytes()
    } else {
        return Err(Error::BadArg);
    };
    Encoding::for_label(&label).ok_or(Error::BadArg)
}

/// Use-after-close is raised; everything else comes back as {:error, message}
fn to_nif_error(err: CsvError) -> Error {
    match &err {
        CsvError::Closed { .. } => Error::RaiseTerm(Box::new(err.to_string())),
        _ => Error::Term(Box::new(err.to_string())),
    }
}

// ============================================================================
// Row Reader NIFs
// ============================================================================

/// Open a reader over a file
#[rustler::nif(schedule = "DirtyIo")]
fn reader_open<'a>(path: String, encoding: Term<'a>, delimiter: Term<'a>) -> NifResult<RowReaderRef> {
    let options = ReaderOptions::new(decode_encoding(encoding)?, decode_delimiter(delimiter)?);
    let reader = RowReader::open(PathBuf::from(path), options).map_err(to_nif_error)?;
    Ok(ResourceArc::new(RowReaderResource::new(reader)))
}

/// Take up to `max` rows; an empty list means the pass is over
#[rustler::nif(schedule = "DirtyIo")]
fn reader_next_rows<'a>(env: Env<'a>, reader: RowReaderRef, max: usize) -> NifResult<Term<'a>> {
    let mut inner = reader.lock()?;
    let rows = inner.take_rows(max).map_err(to_nif_error)?;
    Ok(rows_to_term(env, &rows))
}

/// Reopen the file and start again from the first row
#[rustler::nif(schedule = "DirtyIo")]
fn reader_reset(reader: RowReaderRef) -> NifResult<Atom> {
    let mut inner = reader.lock()?;
    inner.reset().map_err(to_nif_error)?;
    Ok(atoms::ok())
}

/// Release the file handle (idempotent)
#[rustler::nif(schedule = "DirtyIo")]
fn reader_close(reader: RowReaderRef) -> NifResult<Atom> {
    let mut inner = reader.lock()?;
    inner.close();
    Ok(atoms::ok())
}

/// Characters consumed in the current pass
#[rustler::nif(schedule = "DirtyIo")]
fn reader_position(reader: RowReaderRef) -> NifResult<usize> {
    let inner = reader.lock()?;
    inner.position().map_err(to_nif_error)
}

/// Render cells as `(a, "b,c")` for diagnostics
#[rustler::nif]
fn format_row<'a>(cells: Vec<String>, delimiter: Term<'a>) -> NifResult<String> {
    let row = Row::new(cells, decode_delimiter(delimiter)?);
    Ok(row.to_string())
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    let _ = rustler::resource!(RowReaderResource, env);
    true
}

rustler::init!("Elixir.CsvRows.Native", load = load);
