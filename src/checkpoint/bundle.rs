//! TensorFlow V2 tensor-bundle checkpoints.
//!
//! A checkpoint `<prefix>` is an index file `<prefix>.index` plus one or more
//! data shards `<prefix>.data-NNNNN-of-NNNNN`. The index is a LevelDB table
//! mapping tensor names to [`BundleEntryProto`]s; the empty key holds the
//! [`BundleHeaderProto`].

use super::mask_crc;
use crate::{Error, Result};
use prost::Message;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

const TABLE_MAGIC: u64 = 0xdb47_7524_8b80_fb57;
const FOOTER_LEN: usize = 48;
const BLOCK_TRAILER_LEN: usize = 5;
const RESTART_INTERVAL: usize = 16;
const NO_COMPRESSION: u8 = 0;

/// `DT_INT64` in TensorFlow's `DataType` enum.
pub const DT_INT64: i32 = 9;
/// `DT_FLOAT` in TensorFlow's `DataType` enum.
pub const DT_FLOAT: i32 = 1;
/// `DT_DOUBLE` in TensorFlow's `DataType` enum.
pub const DT_DOUBLE: i32 = 2;

#[derive(Clone, PartialEq, Message)]
pub struct BundleHeaderProto {
    #[prost(int32, tag = "1")]
    pub num_shards: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TensorShapeProto {
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<Dim>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Dim {
    #[prost(int64, tag = "1")]
    pub size: i64,
    #[prost(string, tag = "2")]
    pub name: String,
}

/// Location and type of one tensor in the data shards
#[derive(Clone, PartialEq, Message)]
pub struct BundleEntryProto {
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    #[prost(message, optional, tag = "2")]
    pub shape: Option<TensorShapeProto>,
    #[prost(int32, tag = "3")]
    pub shard_id: i32,
    #[prost(int64, tag = "4")]
    pub offset: i64,
    #[prost(int64, tag = "5")]
    pub size: i64,
    /// Masked crc32c of the tensor bytes
    #[prost(fixed32, tag = "6")]
    pub crc32c: u32,
}

/// Public view of a tensor's index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub dtype: i32,
    pub shape: Vec<i64>,
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn data_path(prefix: &Path, shard: i32, num_shards: i32) -> PathBuf {
    with_suffix(prefix, &format!(".data-{shard:05}-of-{num_shards:05}"))
}

/// Decode a LEB128 varint, advancing `pos`.
fn read_varint(buf: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = *buf.get(*pos)?;
        *pos += 1;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHandle {
    offset: u64,
    size: u64,
}

impl BlockHandle {
    fn decode(buf: &[u8], pos: &mut usize) -> Option<Self> {
        Some(Self { offset: read_varint(buf, pos)?, size: read_varint(buf, pos)? })
    }

    fn encode(self, out: &mut Vec<u8>) {
        write_varint(out, self.offset);
        write_varint(out, self.size);
    }
}

/// Parser for the LevelDB table stored in `<prefix>.index`
struct Table<'a> {
    data: &'a [u8],
    path: &'a Path,
}

impl<'a> Table<'a> {
    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::Bundle { path: self.path.to_path_buf(), message: message.into() }
    }

    fn index_handle(&self) -> Result<BlockHandle> {
        if self.data.len() < FOOTER_LEN {
            return Err(self.invalid(format!("file shorter than the {FOOTER_LEN}-byte footer")));
        }
        let footer = &self.data[self.data.len() - FOOTER_LEN..];
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&footer[40..]);
        if u64::from_le_bytes(magic) != TABLE_MAGIC {
            return Err(self.invalid("bad table magic number"));
        }

        let mut pos = 0;
        BlockHandle::decode(footer, &mut pos)
            .and_then(|_metaindex| BlockHandle::decode(footer, &mut pos))
            .ok_or_else(|| self.invalid("corrupt footer block handles"))
    }

    fn block(&self, handle: BlockHandle) -> Result<&'a [u8]> {
        let start = usize::try_from(handle.offset).map_err(|_| self.invalid("block offset overflow"))?;
        let len = usize::try_from(handle.size).map_err(|_| self.invalid("block size overflow"))?;
        let end = start
            .checked_add(len)
            .and_then(|e| e.checked_add(BLOCK_TRAILER_LEN))
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| self.invalid(format!("block at {start}+{len} runs past end of file")))?;

        let contents = &self.data[start..start + len];
        let trailer = &self.data[start + len..end];
        let block_type = trailer[0];
        if block_type != NO_COMPRESSION {
            return Err(self.invalid(format!("unsupported block compression type {block_type}")));
        }

        let stored = u32::from_le_bytes([trailer[1], trailer[2], trailer[3], trailer[4]]);
        let computed = mask_crc(crc32c::crc32c_append(crc32c::crc32c(contents), &trailer[..1]));
        if stored != computed {
            return Err(Error::Checksum {
                context: format!("table block at offset {start} in {}", self.path.display()),
                stored,
                computed,
            });
        }
        Ok(contents)
    }

    /// All (key, value) entries of a block, keys fully expanded.
    fn entries(&self, block: &'a [u8]) -> Result<Vec<(Vec<u8>, &'a [u8])>> {
        if block.len() < 4 {
            return Err(self.invalid("block too short for restart count"));
        }
        let tail = &block[block.len() - 4..];
        let num_restarts = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]) as usize;
        let limit = num_restarts
            .checked_mul(4)
            .and_then(|n| block.len().checked_sub(4 + n))
            .ok_or_else(|| self.invalid("restart array larger than block"))?;
        let region = &block[..limit];

        let mut entries = Vec::new();
        let mut key: Vec<u8> = Vec::new();
        let mut pos = 0;
        while pos < region.len() {
            let corrupt = || self.invalid(format!("corrupt block entry at block offset {pos}"));
            let mut cursor = pos;
            let shared = read_varint(region, &mut cursor).ok_or_else(corrupt)? as usize;
            let non_shared = read_varint(region, &mut cursor).ok_or_else(corrupt)? as usize;
            let value_len = read_varint(region, &mut cursor).ok_or_else(corrupt)? as usize;
            let key_end = cursor.checked_add(non_shared).ok_or_else(corrupt)?;
            let value_end = key_end.checked_add(value_len).ok_or_else(corrupt)?;
            if shared > key.len() || value_end > region.len() {
                return Err(corrupt());
            }

            key.truncate(shared);
            key.extend_from_slice(&region[cursor..key_end]);
            entries.push((key.clone(), &region[key_end..value_end]));
            pos = value_end;
        }
        Ok(entries)
    }

    /// Every key/value pair in the table, in key order.
    fn scan(&self) -> Result<Vec<(Vec<u8>, &'a [u8])>> {
        let index = self.block(self.index_handle()?)?;
        let mut all = Vec::new();
        for (_, handle_bytes) in self.entries(index)? {
            let mut pos = 0;
            let handle = BlockHandle::decode(handle_bytes, &mut pos)
                .ok_or_else(|| self.invalid("corrupt index block handle"))?;
            let block = self.block(handle)?;
            all.extend(self.entries(block)?);
        }
        Ok(all)
    }
}

/// Read access to the tensors of one checkpoint
#[derive(Debug)]
pub struct CheckpointReader {
    prefix: PathBuf,
    num_shards: i32,
    entries: BTreeMap<String, BundleEntryProto>,
}

impl CheckpointReader {
    /// Open the checkpoint at `prefix` (e.g. `savedir/model.ckpt-1000`).
    pub fn open(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let index_path = with_suffix(prefix, ".index");
        if !index_path.is_file() {
            return Err(Error::CheckpointNotFound(prefix.to_path_buf()));
        }
        let data = std::fs::read(&index_path).map_err(|e| Error::io(&index_path, e))?;
        let table = Table { data: &data, path: &index_path };

        let mut num_shards = 1;
        let mut entries = BTreeMap::new();
        for (key, value) in table.scan()? {
            let decode_context = || format!("bundle entry in {}", index_path.display());
            if key.is_empty() {
                let header = BundleHeaderProto::decode(value)
                    .map_err(|source| Error::Protobuf { context: decode_context(), source })?;
                num_shards = header.num_shards.max(1);
                continue;
            }
            let name = String::from_utf8(key)
                .map_err(|_| table.invalid("tensor name is not valid UTF-8"))?;
            let entry = BundleEntryProto::decode(value)
                .map_err(|source| Error::Protobuf { context: decode_context(), source })?;
            entries.insert(name, entry);
        }

        debug!(prefix = %prefix.display(), tensors = entries.len(), num_shards, "opened checkpoint");
        Ok(Self { prefix: prefix.to_path_buf(), num_shards, entries })
    }

    /// Checkpoint prefix this reader was opened with.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Names of all tensors, sorted.
    pub fn tensor_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn has_tensor(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn entry(&self, name: &str) -> Result<&BundleEntryProto> {
        self.entries.get(name).ok_or_else(|| Error::TensorNotFound(name.to_string()))
    }

    /// Dtype and shape of a tensor.
    pub fn info(&self, name: &str) -> Result<TensorInfo> {
        let entry = self.entry(name)?;
        let shape = entry
            .shape
            .as_ref()
            .map(|s| s.dim.iter().map(|d| d.size).collect())
            .unwrap_or_default();
        Ok(TensorInfo { dtype: entry.dtype, shape })
    }

    pub fn shape(&self, name: &str) -> Result<Vec<i64>> {
        Ok(self.info(name)?.shape)
    }

    /// Raw little-endian bytes of a tensor, checksum verified.
    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.entry(name)?;
        let path = data_path(&self.prefix, entry.shard_id, self.num_shards);
        let invalid = |message: String| Error::Bundle { path: path.clone(), message };

        let offset = u64::try_from(entry.offset).map_err(|_| invalid(format!("negative offset for {name}")))?;
        let size = usize::try_from(entry.size).map_err(|_| invalid(format!("negative size for {name}")))?;

        let mut file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        file.seek(SeekFrom::Start(offset)).map_err(|e| Error::io(&path, e))?;
        let mut bytes = vec![0u8; size];
        file.read_exact(&mut bytes).map_err(|e| Error::io(&path, e))?;

        let computed = mask_crc(crc32c::crc32c(&bytes));
        if computed != entry.crc32c {
            return Err(Error::Checksum {
                context: format!("tensor '{name}' in {}", path.display()),
                stored: entry.crc32c,
                computed,
            });
        }
        Ok(bytes)
    }

    /// Value of a scalar `int64` tensor such as `global_step`.
    pub fn read_i64_scalar(&self, name: &str) -> Result<i64> {
        let entry = self.entry(name)?;
        if entry.dtype != DT_INT64 {
            return Err(Error::Bundle {
                path: with_suffix(&self.prefix, ".index"),
                message: format!("tensor '{name}' has dtype {}, expected int64", entry.dtype),
            });
        }
        let bytes = self.read_bytes(name)?;
        let scalar: [u8; 8] = bytes.get(..8).and_then(|b| b.try_into().ok()).ok_or_else(|| {
            Error::Bundle {
                path: data_path(&self.prefix, entry.shard_id, self.num_shards),
                message: format!("tensor '{name}' holds {} bytes, expected 8", bytes.len()),
            }
        })?;
        Ok(i64::from_le_bytes(scalar))
    }
}

/// Builds LevelDB table blocks with prefix-compressed keys.
struct BlockBuilder {
    buf: Vec<u8>,
    restarts: Vec<u32>,
    last_key: Vec<u8>,
    counter: usize,
}

impl BlockBuilder {
    fn new() -> Self {
        Self { buf: Vec::new(), restarts: vec![0], last_key: Vec::new(), counter: 0 }
    }

    fn add(&mut self, key: &[u8], value: &[u8]) {
        let shared = if self.counter < RESTART_INTERVAL {
            self.last_key.iter().zip(key).take_while(|(a, b)| a == b).count()
        } else {
            self.restarts.push(self.buf.len() as u32);
            self.counter = 0;
            0
        };
        write_varint(&mut self.buf, shared as u64);
        write_varint(&mut self.buf, (key.len() - shared) as u64);
        write_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(&key[shared..]);
        self.buf.extend_from_slice(value);
        self.last_key = key.to_vec();
        self.counter += 1;
    }

    fn finish(mut self) -> Vec<u8> {
        for r in &self.restarts {
            self.buf.extend_from_slice(&r.to_le_bytes());
        }
        self.buf.extend_from_slice(&(self.restarts.len() as u32).to_le_bytes());
        self.buf
    }
}

/// Append a block plus trailer to `out`, returning its handle.
fn append_block(out: &mut Vec<u8>, contents: &[u8]) -> BlockHandle {
    let handle = BlockHandle { offset: out.len() as u64, size: contents.len() as u64 };
    out.extend_from_slice(contents);
    let crc = mask_crc(crc32c::crc32c_append(crc32c::crc32c(contents), &[NO_COMPRESSION]));
    out.push(NO_COMPRESSION);
    out.extend_from_slice(&crc.to_le_bytes());
    handle
}

/// Writes single-shard checkpoints in the V2 bundle layout.
///
/// Produces what [`CheckpointReader`] reads; used for fixtures and for
/// exporting small metadata tensors.
#[derive(Debug, Default)]
pub struct BundleWriter {
    data: Vec<u8>,
    entries: BTreeMap<String, BundleEntryProto>,
}

impl BundleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tensor from its raw little-endian bytes.
    pub fn add_tensor(&mut self, name: &str, dtype: i32, shape: &[i64], bytes: &[u8]) -> &mut Self {
        let entry = BundleEntryProto {
            dtype,
            shape: Some(TensorShapeProto {
                dim: shape.iter().map(|&size| Dim { size, name: String::new() }).collect(),
            }),
            shard_id: 0,
            offset: self.data.len() as i64,
            size: bytes.len() as i64,
            crc32c: mask_crc(crc32c::crc32c(bytes)),
        };
        self.data.extend_from_slice(bytes);
        self.entries.insert(name.to_string(), entry);
        self
    }

    pub fn add_i64_scalar(&mut self, name: &str, value: i64) -> &mut Self {
        self.add_tensor(name, DT_INT64, &[], &value.to_le_bytes())
    }

    pub fn add_f32_tensor(&mut self, name: &str, shape: &[i64], values: &[f32]) -> &mut Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_tensor(name, DT_FLOAT, shape, &bytes)
    }

    /// Write `<prefix>.index` and `<prefix>.data-00000-of-00001`.
    pub fn write(&self, prefix: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.as_ref();

        let mut data_block = BlockBuilder::new();
        data_block.add(b"", &BundleHeaderProto { num_shards: 1 }.encode_to_vec());
        let mut last_key: &[u8] = b"";
        for (name, entry) in &self.entries {
            data_block.add(name.as_bytes(), &entry.encode_to_vec());
            last_key = name.as_bytes();
        }

        let mut table = Vec::new();
        let data_handle = append_block(&mut table, &data_block.finish());
        let metaindex_handle = append_block(&mut table, &BlockBuilder::new().finish());

        let mut index_block = BlockBuilder::new();
        let mut handle_bytes = Vec::new();
        data_handle.encode(&mut handle_bytes);
        index_block.add(last_key, &handle_bytes);
        let index_handle = append_block(&mut table, &index_block.finish());

        let mut footer = Vec::with_capacity(FOOTER_LEN);
        metaindex_handle.encode(&mut footer);
        index_handle.encode(&mut footer);
        footer.resize(FOOTER_LEN - 8, 0);
        footer.extend_from_slice(&TABLE_MAGIC.to_le_bytes());
        table.extend_from_slice(&footer);

        let index_path = with_suffix(prefix, ".index");
        std::fs::write(&index_path, table).map_err(|e| Error::io(&index_path, e))?;
        let shard_path = data_path(prefix, 0, 1);
        std::fs::write(&shard_path, &self.data).map_err(|e| Error::io(&shard_path, e))?;
        Ok(())
    }
}
