//! Synthetic raw memory dumps and matching ISF profiles for CLI tests
#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

/// Direct-map base: virtual `BASE + n` is physical (and file) offset `n`.
pub const BASE: u64 = 0xffff888000000000;
pub const INIT_TASK: u64 = BASE + 0x100;
pub const SOCKET_FILE_OPS: u64 = 0xffffffff81a0b0c0;
pub const EXT4_FILE_OPS: u64 = 0xffffffff81a2f1e0;

const TASK_SIZE: u64 = 0x100;
const SOCKET_SIZE: u64 = 0x30;
const INODE_SIZE: u64 = 0x80;

pub const TCP_ESTABLISHED: u8 = 1;
pub const TCP_LISTEN: u8 = 10;

pub struct Dump {
    bytes: Vec<u8>,
    next: u64,
    last_task: u64,
}

impl Dump {
    pub fn new() -> Self {
        let mut dump = Dump {
            bytes: vec![0u8; 0x100],
            next: INIT_TASK,
            last_task: INIT_TASK,
        };
        let init = dump.alloc(TASK_SIZE);
        dump.put(init + 0x30, b"swapper/0");
        dump.put_u64(init + 0x10, init + 0x10);
        dump.put_u64(init + 0x18, init + 0x10);
        dump
    }

    fn alloc(&mut self, size: u64) -> u64 {
        let address = self.next;
        self.next = (address + size + 0xf) & !0xf;
        let end = (self.next - BASE) as usize;
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        address
    }

    fn put(&mut self, address: u64, data: &[u8]) {
        let start = (address - BASE) as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    fn put_u64(&mut self, address: u64, value: u64) {
        self.put(address, &value.to_le_bytes());
    }

    /// Append a task holding the given open files (0 = closed slot).
    pub fn task(&mut self, pid: i32, comm: &str, files: &[u64]) -> u64 {
        let task = self.alloc(TASK_SIZE);
        self.put(task + 0x20, &pid.to_le_bytes());
        self.put(task + 0x30, comm.as_bytes());

        let last = self.last_task;
        self.put_u64(task + 0x10, INIT_TASK + 0x10);
        self.put_u64(task + 0x18, last + 0x10);
        self.put_u64(last + 0x10, task + 0x10);
        self.put_u64(INIT_TASK + 0x18, task + 0x10);
        self.last_task = task;

        let array = self.alloc((files.len().max(1) * 8) as u64);
        for (i, file) in files.iter().enumerate() {
            self.put_u64(array + (i as u64) * 8, *file);
        }
        let fdt = self.alloc(0x20);
        self.put(fdt, &(files.len() as u32).to_le_bytes());
        self.put_u64(fdt + 0x8, array);
        let files_struct = self.alloc(0x40);
        self.put_u64(files_struct + 0x8, fdt);
        self.put_u64(task + 0x50, files_struct);
        task
    }

    fn file(&mut self, f_op: u64, inode: u64) -> u64 {
        let dentry = self.alloc(0x40);
        self.put_u64(dentry + 0x30, inode);
        let file = self.alloc(0x40);
        self.put_u64(file + 0x18, dentry);
        self.put_u64(file + 0x28, f_op);
        file
    }

    pub fn regular_file(&mut self) -> u64 {
        let inode = self.alloc(INODE_SIZE);
        self.file(EXT4_FILE_OPS, inode)
    }

    /// A socket file; `protocol` is the IP protocol number.
    pub fn socket(
        &mut self,
        protocol: u8,
        state: u8,
        local: ([u8; 4], u16),
        remote: ([u8; 4], u16),
    ) -> u64 {
        let socket = self.alloc(SOCKET_SIZE + INODE_SIZE);
        let inet = self.alloc(0x80);
        self.put_u64(socket + 0x18, inet);

        self.put(inet + 0x10, &2u16.to_le_bytes());
        self.put(inet + 0x12, &[state]);
        self.put(inet + 0x28, &(u32::from(protocol) << 8).to_le_bytes());
        self.put(inet + 0x60, &remote.0);
        self.put(inet + 0x64, &local.0);
        self.put(inet + 0x68, &remote.1.to_be_bytes());
        self.put(inet + 0x6a, &local.1.to_be_bytes());

        self.file(SOCKET_FILE_OPS, socket + SOCKET_SIZE)
    }

    pub fn write(&self, dir: &TempDir) -> PathBuf {
        let path = dir.path().join("mem.raw");
        std::fs::write(&path, &self.bytes).unwrap();
        path
    }
}

fn field(offset: u64, ty: Value) -> Value {
    json!({ "offset": offset, "type": ty })
}

fn base(name: &str) -> Value {
    json!({ "kind": "base", "name": name })
}

fn embedded(name: &str) -> Value {
    json!({ "kind": "struct", "name": name })
}

fn pointer_to(name: &str) -> Value {
    json!({ "kind": "pointer", "subtype": { "kind": "struct", "name": name } })
}

/// dwarf2json profile for the layout [`Dump`] writes, using the newer
/// `inet_*` field names.
pub fn isf() -> Value {
    json!({
        "metadata": { "format": "6.2.0" },
        "base_types": {
            "int": { "size": 4, "signed": true, "kind": "int", "endian": "little" },
            "unsigned int": { "size": 4, "signed": false, "kind": "int", "endian": "little" },
            "unsigned short": { "size": 2, "signed": false, "kind": "int", "endian": "little" },
            "unsigned char": { "size": 1, "signed": false, "kind": "char", "endian": "little" },
            "char": { "size": 1, "signed": true, "kind": "char", "endian": "little" },
            "pointer": { "size": 8, "signed": false, "kind": "int", "endian": "little" }
        },
        "user_types": {
            "list_head": { "kind": "struct", "size": 16, "fields": {
                "next": field(0, pointer_to("list_head")),
                "prev": field(8, pointer_to("list_head"))
            }},
            "task_struct": { "kind": "struct", "size": TASK_SIZE, "fields": {
                "tasks": field(0x10, embedded("list_head")),
                "pid": field(0x20, base("int")),
                "comm": field(0x30, json!({ "kind": "array", "count": 16, "subtype": base("char") })),
                "files": field(0x50, pointer_to("files_struct"))
            }},
            "files_struct": { "kind": "struct", "size": 0x40, "fields": {
                "fdt": field(0x8, pointer_to("fdtable"))
            }},
            "fdtable": { "kind": "struct", "size": 0x20, "fields": {
                "max_fds": field(0, base("unsigned int")),
                "fd": field(0x8, json!({ "kind": "pointer", "subtype": pointer_to("file") }))
            }},
            "file": { "kind": "struct", "size": 0x40, "fields": {
                "f_path": field(0x10, embedded("path")),
                "f_op": field(0x28, pointer_to("file_operations"))
            }},
            "path": { "kind": "struct", "size": 0x10, "fields": {
                "mnt": field(0, pointer_to("vfsmount")),
                "dentry": field(0x8, pointer_to("dentry"))
            }},
            "dentry": { "kind": "struct", "size": 0x40, "fields": {
                "d_inode": field(0x30, pointer_to("inode"))
            }},
            "inode": { "kind": "struct", "size": INODE_SIZE, "fields": {} },
            "socket": { "kind": "struct", "size": SOCKET_SIZE, "fields": {
                "sk": field(0x18, pointer_to("sock"))
            }},
            "sock_common": { "kind": "struct", "size": 0x20, "fields": {
                "skc_family": field(0x10, base("unsigned short")),
                "skc_state": field(0x12, base("unsigned char"))
            }},
            "sock": { "kind": "struct", "size": 0x60, "fields": {
                "__sk_common": field(0, embedded("sock_common")),
                "sk_protocol": field(0x28, json!({
                    "kind": "bitfield", "bit_position": 8, "bit_length": 8,
                    "type": base("unsigned int")
                }))
            }},
            "inet_sock": { "kind": "struct", "size": 0x80, "fields": {
                "sk": field(0, embedded("sock")),
                "inet_daddr": field(0x60, base("unsigned int")),
                "inet_rcv_saddr": field(0x64, base("unsigned int")),
                "inet_dport": field(0x68, base("unsigned short")),
                "inet_sport": field(0x6a, base("unsigned short"))
            }}
        },
        "enums": {},
        "symbols": {
            "init_task": { "address": INIT_TASK },
            "socket_file_ops": { "address": SOCKET_FILE_OPS }
        }
    })
}

pub fn write_profile(profile: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(profile.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
