//! Fragmented (interleaved) part reassembly and emission (spec §4.4).

use crate::backend::{ReadBackend, WriteBackend};
use crate::error::{Error, Result};
use std::io::{Cursor, Read};

/// Read-side reassembly of a part physically split into `P/[0].piece`,
/// `P/[1].piece`, ..., `P/[n].last.piece`.
///
/// Not seekable: bytes are produced strictly in fragment order. Each fragment is
/// read into memory as a whole when it is opened (see [`crate::backend::ReadBackend`]
/// for why), then drained fragment-by-fragment as the caller reads.
pub struct FragmentedPartReader<'a, B: ReadBackend> {
    backend: &'a mut B,
    base_name: String,
    next_fragment: u32,
    finished: bool,
    current: Cursor<Vec<u8>>,
}

impl<'a, B: ReadBackend> FragmentedPartReader<'a, B> {
    pub(crate) fn new(backend: &'a mut B, base_name: String) -> Result<Self> {
        let mut reader = Self {
            backend,
            base_name,
            next_fragment: 0,
            finished: false,
            current: Cursor::new(Vec::new()),
        };
        reader.open_next_fragment()?;
        Ok(reader)
    }

    fn open_next_fragment(&mut self) -> Result<()> {
        let plain = format!("{}/[{}].piece", self.base_name, self.next_fragment);
        let data = match self.backend.read_item(&plain) {
            Ok(data) => data,
            Err(Error::NotFound(_)) => {
                let last = format!("{}/[{}].last.piece", self.base_name, self.next_fragment);
                match self.backend.read_item(&last) {
                    Ok(data) => {
                        self.finished = true;
                        data
                    }
                    Err(Error::NotFound(_)) => {
                        return Err(Error::MissingFragment {
                            part: self.base_name.clone(),
                            index: self.next_fragment,
                        })
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };
        self.next_fragment += 1;
        self.current = Cursor::new(data);
        Ok(())
    }
}

impl<'a, B: ReadBackend> Read for FragmentedPartReader<'a, B> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            let n = self.current.read(buf)?;
            if n > 0 || self.finished {
                return Ok(n);
            }
            self.open_next_fragment()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        }
    }
}

/// Write-side handle for emitting a part as an ordered sequence of fragments.
///
/// Holds only the part's own state (base name, content type, fragment count) and
/// no reference to the backend, so it does not borrow the writer it came from:
/// other parts may be opened and written on the same writer between fragment
/// writes (spec §5's ordering guarantee — physical emissions follow the order of
/// `open_part`/`create_fragmented_part` calls interleaved with fragment `next`
/// calls). Each [`Self::next`] call borrows the backend only for its own duration.
///
/// The caller decides when to seal the part by passing `last = true` to the final
/// `next` call. Calling `next` again afterwards is an error (spec §4.4).
pub struct FragmentedPartWriter {
    base_name: String,
    content_type: String,
    fragment_number: u32,
    finished: bool,
}

impl FragmentedPartWriter {
    pub(crate) fn new(base_name: String, content_type: String) -> Self {
        Self {
            base_name,
            content_type,
            fragment_number: 0,
            finished: false,
        }
    }

    /// Create the next fragment on `backend` and return a writer for its bytes.
    /// `last` seals the part: no further fragments may be created afterwards.
    pub fn next<'b, B: WriteBackend>(&mut self, backend: &'b mut B, last: bool) -> Result<B::ItemWriter<'b>> {
        if self.finished {
            return Err(Error::AlreadyFinished(self.base_name.clone()));
        }
        let suffix = if last { ".last" } else { "" };
        let item_name = format!("{}/[{}]{}.piece", self.base_name, self.fragment_number, suffix);
        let writer = backend.create_item(&item_name, &self.content_type)?;
        self.fragment_number += 1;
        self.finished = last;
        if last {
            log::debug!("closed fragmented part {} after {} fragments", self.base_name, self.fragment_number);
        }
        Ok(writer)
    }

    /// Whether the final (`.last.piece`) fragment has already been written.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
