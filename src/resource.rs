// ResourceArc wrapper for the row reader
//
// Lets one open reader persist across NIF calls. The Mutex serializes
// callers; the reader itself is single-pass and never shared unguarded.
// A read holds the lock for a whole batch, so every NIF that takes it runs
// on a dirty IO scheduler.

use crate::reader::RowReader;
use rustler::{Error, NifResult, ResourceArc};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

pub struct RowReaderResource {
    pub inner: Mutex<RowReader<PathBuf>>,
}

impl RowReaderResource {
    pub fn new(reader: RowReader<PathBuf>) -> Self {
        RowReaderResource {
            inner: Mutex::new(reader),
        }
    }

    pub fn lock(&self) -> NifResult<MutexGuard<'_, RowReader<PathBuf>>> {
        self.inner
            .lock()
            .map_err(|_| Error::RaiseAtom("reader_lock_poisoned"))
    }
}

/// Type alias for the ResourceArc
pub type RowReaderRef = ResourceArc<RowReaderResource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReaderOptions;
    use std::io::Write;
    use std::sync::Arc;
    use std::thread;
    use tempfile::NamedTempFile;

    #[test]
    fn test_close_waits_for_an_in_flight_read() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "a,b\nc,d\n").unwrap();
        tmp.flush().unwrap();

        let reader = RowReader::open(tmp.path().to_path_buf(), ReaderOptions::default()).unwrap();
        let resource = Arc::new(RowReaderResource::new(reader));

        let mut reading = resource.lock().unwrap();
        let closer = {
            let resource = Arc::clone(&resource);
            thread::spawn(move || resource.lock().map(|mut reader| reader.close()).is_ok())
        };

        // the batch completes before the close gets the reader
        assert_eq!(reading.take_rows(10).unwrap().len(), 2);
        assert!(!reading.is_closed());
        drop(reading);

        assert!(closer.join().unwrap());
        assert!(resource.lock().unwrap().is_closed());
    }
}
