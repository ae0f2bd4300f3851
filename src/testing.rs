//! Synthetic kernel images for unit tests
use crate::core::profile::{FieldLayout, Profile, StructLayout};
use crate::memory::FlatImage;

pub const BASE: u64 = 0xffff888000000000;
pub const INIT_TASK: u64 = BASE + 0x100;
pub const SOCKET_FILE_OPS: u64 = 0xffffffff81a0b0c0;
pub const EXT4_FILE_OPS: u64 = 0xffffffff81a2f1e0;

pub const TASK_SIZE: usize = 0x100;
pub const SOCKET_SIZE: usize = 0x30;
pub const INODE_SIZE: usize = 0x80;
pub const INET_SOCK_SIZE: usize = 0x80;

pub const TCP_ESTABLISHED: u8 = 1;
pub const TCP_LISTEN: u8 = 10;

/// Struct layouts of a small, made-up x86_64 kernel.
pub fn profile() -> Profile {
    Profile::new()
        .with_struct(
            "list_head",
            StructLayout::new(0x10)
                .with_field("next", FieldLayout::new(0x0, 8).with_target("list_head"))
                .with_field("prev", FieldLayout::new(0x8, 8).with_target("list_head")),
        )
        .with_struct(
            "task_struct",
            StructLayout::new(TASK_SIZE)
                .with_field("tasks", FieldLayout::new(0x10, 0x10).with_target("list_head"))
                .with_field("pid", FieldLayout::new(0x20, 4))
                .with_field("comm", FieldLayout::new(0x30, 16))
                .with_field("files", FieldLayout::new(0x50, 8).with_target("files_struct")),
        )
        .with_struct(
            "files_struct",
            StructLayout::new(0x40).with_field("fdt", FieldLayout::new(0x8, 8).with_target("fdtable")),
        )
        .with_struct(
            "fdtable",
            StructLayout::new(0x20)
                .with_field("max_fds", FieldLayout::new(0x0, 4))
                .with_field("fd", FieldLayout::new(0x8, 8)),
        )
        .with_struct(
            "file",
            StructLayout::new(0x40)
                .with_field("f_path", FieldLayout::new(0x10, 0x10).with_target("path"))
                .with_field("f_op", FieldLayout::new(0x28, 8).with_target("file_operations")),
        )
        .with_struct(
            "path",
            StructLayout::new(0x10)
                .with_field("mnt", FieldLayout::new(0x0, 8).with_target("vfsmount"))
                .with_field("dentry", FieldLayout::new(0x8, 8).with_target("dentry")),
        )
        .with_struct(
            "dentry",
            StructLayout::new(0x40).with_field("d_inode", FieldLayout::new(0x30, 8).with_target("inode")),
        )
        .with_struct("inode", StructLayout::new(INODE_SIZE))
        .with_struct(
            "socket",
            StructLayout::new(SOCKET_SIZE)
                .with_field("state", FieldLayout::new(0x0, 4))
                .with_field("type", FieldLayout::new(0x4, 2))
                .with_field("sk", FieldLayout::new(0x18, 8).with_target("sock")),
        )
        .with_struct(
            "sock_common",
            StructLayout::new(0x20)
                .with_field("skc_family", FieldLayout::new(0x10, 2))
                .with_field("skc_state", FieldLayout::new(0x12, 1)),
        )
        .with_struct(
            "sock",
            StructLayout::new(0x60)
                .with_field("__sk_common", FieldLayout::new(0x0, 0x20).with_target("sock_common"))
                .with_field("sk_protocol", FieldLayout::new(0x28, 4).with_bits(8, 8)),
        )
        .with_struct(
            "inet_sock",
            StructLayout::new(INET_SOCK_SIZE)
                .with_field("sk", FieldLayout::new(0x0, 0x60).with_target("sock"))
                .with_field("daddr", FieldLayout::new(0x60, 4))
                .with_field("rcv_saddr", FieldLayout::new(0x64, 4))
                .with_field("dport", FieldLayout::new(0x68, 2))
                .with_field("sport", FieldLayout::new(0x6a, 2)),
        )
        .with_symbol("init_task", INIT_TASK)
        .with_symbol("socket_file_ops", SOCKET_FILE_OPS)
}

/// One socket's fields as they should appear in memory.
#[derive(Debug, Clone)]
pub struct SocketSpec {
    /// Whole `sk_protocol` storage word; the protocol number is bits 8-15.
    pub protocol_raw: u32,
    pub state: u8,
    pub local: [u8; 4],
    /// Host order; stored big-endian.
    pub local_port: u16,
    pub remote: [u8; 4],
    pub remote_port: u16,
}

impl SocketSpec {
    pub fn tcp(local: [u8; 4], local_port: u16, remote: [u8; 4], remote_port: u16, state: u8) -> Self {
        SocketSpec {
            protocol_raw: 0x0600,
            state,
            local,
            local_port,
            remote,
            remote_port,
        }
    }

    pub fn udp(local: [u8; 4], local_port: u16) -> Self {
        SocketSpec {
            protocol_raw: 0x1100,
            state: 7,
            local,
            local_port,
            remote: [0, 0, 0, 0],
            remote_port: 0,
        }
    }
}

/// Bump-allocated kernel memory starting at [`BASE`], with `init_task`
/// already in place.
pub struct KernelImage {
    bytes: Vec<u8>,
    next: u64,
    last_task: u64,
}

impl KernelImage {
    pub fn new() -> Self {
        let mut image = KernelImage {
            bytes: vec![0u8; 0x100],
            next: INIT_TASK,
            last_task: INIT_TASK,
        };
        let init = image.alloc(TASK_SIZE);
        image.put_u32(init + 0x20, 0);
        image.put(init + 0x30, b"swapper/0");
        image.put_u64(init + 0x10, init + 0x10);
        image.put_u64(init + 0x18, init + 0x10);
        image
    }

    pub fn alloc(&mut self, size: usize) -> u64 {
        let address = self.next;
        self.next = (address + size as u64 + 0xf) & !0xf;
        let end = (self.next - BASE) as usize;
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        address
    }

    pub fn put(&mut self, address: u64, data: &[u8]) {
        let start = (address - BASE) as usize;
        if self.bytes.len() < start + data.len() {
            self.bytes.resize(start + data.len(), 0);
        }
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    pub fn put_u32(&mut self, address: u64, value: u32) {
        self.put(address, &value.to_le_bytes());
    }

    pub fn put_u64(&mut self, address: u64, value: u64) {
        self.put(address, &value.to_le_bytes());
    }

    /// Append a task to the circular `tasks` list.
    pub fn add_task(&mut self, pid: i32, comm: &str) -> u64 {
        let task = self.alloc(TASK_SIZE);
        self.put_u32(task + 0x20, pid as u32);
        self.put(task + 0x30, comm.as_bytes());

        let last = self.last_task;
        self.put_u64(task + 0x10, INIT_TASK + 0x10);
        self.put_u64(task + 0x18, last + 0x10);
        self.put_u64(last + 0x10, task + 0x10);
        self.put_u64(INIT_TASK + 0x18, task + 0x10);
        self.last_task = task;
        task
    }

    /// Give a task an fd table; zero entries are closed descriptors.
    pub fn set_files(&mut self, task: u64, files: &[u64]) {
        let array = self.alloc(files.len().max(1) * 8);
        for (i, file) in files.iter().enumerate() {
            self.put_u64(array + (i as u64) * 8, *file);
        }
        let fdt = self.alloc(0x20);
        self.put_u32(fdt, files.len() as u32);
        self.put_u64(fdt + 0x8, array);
        let files_struct = self.alloc(0x40);
        self.put_u64(files_struct + 0x8, fdt);
        self.put_u64(task + 0x50, files_struct);
    }

    pub fn add_file(&mut self, f_op: u64, inode: u64) -> u64 {
        let dentry = self.alloc(0x40);
        self.put_u64(dentry + 0x30, inode);
        let file = self.alloc(0x40);
        self.put_u64(file + 0x18, dentry);
        self.put_u64(file + 0x28, f_op);
        file
    }

    pub fn add_regular_file(&mut self) -> u64 {
        let inode = self.alloc(INODE_SIZE);
        self.add_file(EXT4_FILE_OPS, inode)
    }

    /// Lay out `socket_alloc` plus its `inet_sock`; returns the inode address.
    pub fn add_socket(&mut self, spec: &SocketSpec) -> u64 {
        let socket = self.alloc(SOCKET_SIZE + INODE_SIZE);
        let inet = self.alloc(INET_SOCK_SIZE);
        self.put_u64(socket + 0x18, inet);

        self.put(inet + 0x10, &2u16.to_le_bytes());
        self.put(inet + 0x12, &[spec.state]);
        self.put_u32(inet + 0x28, spec.protocol_raw);
        self.put(inet + 0x60, &spec.remote);
        self.put(inet + 0x64, &spec.local);
        self.put(inet + 0x68, &spec.remote_port.to_be_bytes());
        self.put(inet + 0x6a, &spec.local_port.to_be_bytes());

        socket + SOCKET_SIZE as u64
    }

    pub fn add_socket_file(&mut self, spec: &SocketSpec) -> u64 {
        let inode = self.add_socket(spec);
        self.add_file(SOCKET_FILE_OPS, inode)
    }

    pub fn end(&self) -> u64 {
        BASE + self.bytes.len() as u64
    }

    pub fn into_space(self) -> FlatImage<Vec<u8>> {
        FlatImage::with_base(BASE, self.bytes)
    }
}
