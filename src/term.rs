// Term building for rows handed to Elixir

use crate::reader::Row;
use rustler::{Env, NewBinary, Term};

/// Convert rows to an Elixir list of lists of binaries
pub fn rows_to_term<'a>(env: Env<'a>, rows: &[Row]) -> Term<'a> {
    // Build list in reverse (cons lists prepend cheaply)
    let mut list = Term::list_new_empty(env);

    for row in rows.iter().rev() {
        list = list.list_prepend(cells_to_term(env, row));
    }

    list
}

/// Convert a single row's cells to an Elixir list of binaries
pub fn cells_to_term<'a>(env: Env<'a>, row: &Row) -> Term<'a> {
    let mut list = Term::list_new_empty(env);

    for cell in row.iter().rev() {
        let bytes = cell.as_bytes();
        let mut binary = NewBinary::new(env, bytes.len());
        binary.as_mut_slice().copy_from_slice(bytes);
        let binary_term: Term = binary.into();
        list = list.list_prepend(binary_term);
    }

    list
}
