//! Resource archive container and the XML manifest compiler that produces it.

mod archive;
mod atomic_io;
mod compiler;
mod hashing;

pub use archive::{read_archive, write_archive, ArchiveError, ResourceArchive, ARCHIVE_FORMAT_VERSION};
pub use compiler::{
    compile_archive_file, compile_archive_str, ArchiveCompileError, ArchiveErrorCode,
    SourceLocation,
};
