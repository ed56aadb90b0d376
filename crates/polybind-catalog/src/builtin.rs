//! Built-in demonstration catalog.
//!
//! A representative slice of a disk-image manipulation API: library-side
//! actions (handle configuration, drive setup), daemon-side actions
//! (filesystem and volume operations) and binding self-test actions that
//! together exercise every argument kind, optional-argument kind, return
//! style and struct field representation.

use polybind_types::{
    Action, ArgKind, Deprecation, FieldKind, OptArgKind, Return, StringKind, StructDef, Version,
    Visibility,
};

use crate::Catalog;

/// Build the demo catalog.
///
/// The data is static and known-valid; a failure here is a bug in this file.
pub fn catalog() -> polybind_types::Result<Catalog> {
    Catalog::new(vec![library_actions(), daemon_actions()], structs())
}

// ══════════════════════════════════════════════════════════════════════════════
// Shorthands
// ══════════════════════════════════════════════════════════════════════════════

const fn v(major: u32, minor: u32, release: u32) -> Version {
    Version::new(major, minor, release)
}

const PLAIN: ArgKind = ArgKind::String(StringKind::Plain);
const PATH: ArgKind = ArgKind::String(StringKind::Path);
const DEVICE: ArgKind = ArgKind::String(StringKind::Device);
const FILE_IN: ArgKind = ArgKind::String(StringKind::FileIn);
const FILE_OUT: ArgKind = ArgKind::String(StringKind::FileOut);
const KEY: ArgKind = ArgKind::String(StringKind::Key);

fn s(name: &str) -> String {
    name.to_string()
}

fn one(name: &str, of: &str) -> Return {
    Return::Struct {
        name: s(name),
        of: s(of),
    }
}

fn many(name: &str, of: &str) -> Return {
    Return::StructList {
        name: s(name),
        of: s(of),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Structs
// ══════════════════════════════════════════════════════════════════════════════

fn structs() -> Vec<StructDef> {
    use FieldKind::*;
    vec![
        StructDef::new("int_bool", &[("i", Int32), ("b", Int32)]),
        StructDef::new(
            "version",
            &[
                ("major", Int64),
                ("minor", Int64),
                ("release", Int64),
                ("extra", String),
            ],
        ),
        StructDef::new(
            "lvm_pv",
            &[
                ("pv_name", String),
                ("pv_uuid", Uuid),
                ("pv_fmt", String),
                ("pv_size", Bytes),
                ("dev_size", Bytes),
                ("pv_free", Bytes),
                ("pv_used", Bytes),
                ("pv_attr", String),
                ("pv_pe_count", Int64),
                ("pv_pe_alloc_count", Int64),
                ("pv_tags", String),
                ("pe_start", Bytes),
                ("pv_mda_count", Int64),
                ("pv_mda_free", Bytes),
            ],
        ),
        StructDef::new(
            "lvm_lv",
            &[
                ("lv_name", String),
                ("lv_uuid", Uuid),
                ("lv_attr", String),
                ("lv_major", Int64),
                ("lv_minor", Int64),
                ("lv_size", Bytes),
                ("seg_count", Int64),
                ("origin", String),
                ("snap_percent", OptPercent),
                ("copy_percent", OptPercent),
                ("move_pv", String),
                ("lv_tags", String),
            ],
        ),
        StructDef::new(
            "statns",
            &[
                ("st_dev", Int64),
                ("st_ino", Int64),
                ("st_mode", Int64),
                ("st_nlink", Int64),
                ("st_uid", Int64),
                ("st_gid", Int64),
                ("st_rdev", Int64),
                ("st_size", Int64),
                ("st_blksize", Int64),
                ("st_blocks", Int64),
                ("st_atime_sec", Int64),
                ("st_atime_nsec", Int64),
                ("st_mtime_sec", Int64),
                ("st_mtime_nsec", Int64),
                ("st_ctime_sec", Int64),
                ("st_ctime_nsec", Int64),
            ],
        ),
        StructDef::new("dirent", &[("ino", Int64), ("ftyp", Char), ("name", String)]),
        StructDef::new("xattr", &[("attrname", String), ("attrval", Buffer)]),
        StructDef::new(
            "partition",
            &[
                ("part_num", Int32),
                ("part_start", Bytes),
                ("part_end", Bytes),
                ("part_size", Bytes),
            ],
        ),
        StructDef::new(
            "inotify_event",
            &[
                ("in_wd", Int64),
                ("in_mask", UInt32),
                ("in_cookie", UInt32),
                ("in_name", String),
            ],
        ),
        StructDef::new(
            "btrfssubvolume",
            &[
                ("btrfssubvolume_id", UInt64),
                ("btrfssubvolume_top_level_id", UInt64),
                ("btrfssubvolume_path", String),
            ],
        ),
        StructDef::new(
            "utsname",
            &[
                ("uts_sysname", String),
                ("uts_release", String),
                ("uts_version", String),
                ("uts_machine", String),
            ],
        ),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Library-side actions
// ══════════════════════════════════════════════════════════════════════════════

fn library_actions() -> Vec<Action> {
    vec![
        Action::new("add_drive", Return::Err, v(1, 5, 23))
            .arg("filename", PLAIN)
            .optarg("readonly", OptArgKind::Bool, 0)
            .optarg("format", OptArgKind::String, 1)
            .optarg("iface", OptArgKind::String, 2)
            .optarg("label", OptArgKind::String, 4)
            .optarg("protocol", OptArgKind::String, 5)
            .optarg("server", OptArgKind::StringList, 6)
            .optarg("blocksize", OptArgKind::Int, 12)
            .doc(
                "add an image to examine or modify",
                "This function adds a disk image called F<filename> to the handle.\n\
                 \n\
                 The optional C<readonly> flag adds the drive in read-only mode. \
                 C<format> forces the image format, otherwise it is detected. \
                 C<server> lists the servers to use when C<protocol> is a network \
                 protocol.",
            ),
        Action::new("add_drive_ro", Return::Err, v(1, 0, 38))
            .arg("filename", PLAIN)
            .deprecated(Deprecation::ReplacedBy(s("add_drive")))
            .doc(
                "add a drive in snapshot mode (read-only)",
                "This function is the equivalent of calling C<add_drive> with \
                 the C<readonly> optional argument set to true.",
            ),
        Action::new("set_path", Return::Err, v(1, 0, 3))
            .arg("searchpath", ArgKind::OptString)
            .doc(
                "set the search path",
                "Set the path that is searched for the appliance.\n\
                 \n\
                 Setting C<searchpath> to C<NULL> restores the default path.",
            ),
        Action::new("get_path", Return::ConstString(s("path")), v(1, 0, 3)).doc(
            "get the search path",
            "Return the current search path.\n\
             \n\
             This is always non-NULL.",
        ),
        Action::new("set_trace", Return::Err, v(1, 0, 69))
            .arg("trace", ArgKind::Bool)
            .doc(
                "enable or disable command traces",
                "If the command trace flag is set to true then every call is \
                 traced to the event system.",
            ),
        Action::new("get_trace", Return::Bool(s("trace")), v(1, 0, 69))
            .doc("get command trace enabled flag", "Return the command trace flag."),
        Action::new("set_memsize", Return::Err, v(1, 0, 55))
            .arg("memsize", ArgKind::Int)
            .doc(
                "set memory allocated to the appliance",
                "This sets the memory size in megabytes allocated to the appliance.",
            ),
        Action::new("get_memsize", Return::Int(s("memsize")), v(1, 0, 55)).doc(
            "get memory allocated to the appliance",
            "This gets the memory size in megabytes allocated to the appliance.",
        ),
        Action::new("version", one("version", "version"), v(1, 0, 58)).doc(
            "get the library version number",
            "Return the library version number.\n\
             \n\
             The C<extra> field is a free-form string describing the build.",
        ),
        Action::new("disk_create", Return::Err, v(1, 25, 31))
            .arg("filename", PLAIN)
            .arg("format", PLAIN)
            .arg("size", ArgKind::Int64)
            .optarg("backingfile", OptArgKind::String, 0)
            .optarg("backingformat", OptArgKind::String, 1)
            .optarg("preallocation", OptArgKind::String, 2)
            .optarg("compat", OptArgKind::String, 3)
            .optarg("clustersize", OptArgKind::Int, 4)
            .doc(
                "create a blank disk image",
                "Create a blank disk image called F<filename> with format C<format> \
                 and size C<size> bytes.",
            ),
        Action::new("get_sockdir", Return::String(s("sockdir")), v(1, 33, 8)).doc(
            "get the temporary directory for sockets",
            "Get the directory used by the handle to store temporary socket files.",
        ),
        Action::new("inspect_get_roots", Return::StringList(s("roots")), v(1, 7, 3)).doc(
            "return list of operating systems found by last inspection",
            "This function returns the list of operating systems found by the \
             last call to C<inspect_os>.",
        ),
        Action::new(
            "inspect_get_mountpoints",
            Return::Hashtable(s("mountpoints")),
            v(1, 5, 3),
        )
        .arg("root", DEVICE)
        .doc(
            "get mountpoints",
            "This returns a hash of where the operating system expects \
             filesystems to be mounted, ordered from the root down.",
        ),
        Action::new("internal_test", Return::Err, v(1, 0, 0))
            .arg("str", PLAIN)
            .arg("optstr", ArgKind::OptString)
            .arg("strlist", ArgKind::StringList)
            .arg("b", ArgKind::Bool)
            .arg("integer", ArgKind::Int)
            .arg("integer64", ArgKind::Int64)
            .arg("filein", FILE_IN)
            .arg("fileout", FILE_OUT)
            .arg("bufferin", ArgKind::BufferIn)
            .optarg("obool", OptArgKind::Bool, 0)
            .optarg("oint", OptArgKind::Int, 1)
            .optarg("oint64", OptArgKind::Int64, 2)
            .optarg("ostring", OptArgKind::String, 3)
            .optarg("ostringlist", OptArgKind::StringList, 4)
            .visibility(Visibility::BindingSelfTest)
            .doc(
                "internal test function - do not use",
                "This is an internal test function which is used to test whether \
                 the automatically generated bindings can handle every possible \
                 parameter type correctly.",
            ),
        Action::new("internal_test_only_optargs", Return::Err, v(1, 0, 0))
            .optarg("test", OptArgKind::Int, 0)
            .visibility(Visibility::BindingSelfTest)
            .doc(
                "internal test function - do not use",
                "Tests an action with optional arguments but no positional ones.",
            ),
        Action::new(
            "internal_test_rconstoptstring",
            Return::ConstOptString(s("valout")),
            v(1, 0, 0),
        )
        .arg("val", PLAIN)
        .visibility(Visibility::BindingSelfTest)
        .doc(
            "internal test function - do not use",
            "Tests the optional constant string return style.",
        ),
        Action::new(
            "internal_test_rhashtable",
            Return::Hashtable(s("valout")),
            v(1, 0, 0),
        )
        .arg("val", PLAIN)
        .visibility(Visibility::BindingSelfTest)
        .doc(
            "internal test function - do not use",
            "Tests the hashtable return style.",
        ),
        Action::new(
            "internal_test_rint64err",
            Return::Int64(s("valout")),
            v(1, 0, 0),
        )
        .visibility(Visibility::BindingSelfTest)
        .doc(
            "internal test function - do not use",
            "Tests that a 64-bit error return is raised.",
        ),
        Action::new("internal_test_pointer", Return::Err, v(1, 0, 0))
            .arg("data", ArgKind::Pointer(s("void *")))
            .visibility(Visibility::BindingSelfTest)
            .doc(
                "internal test function - do not use",
                "Tests that raw pointers pass through unchanged.",
            ),
        Action::new("internal_free_cache", Return::Err, v(1, 29, 0))
            .visibility(Visibility::Internal)
            .doc("drop cached appliance", "Internal use only."),
        Action::new("debug", Return::String(s("result")), v(1, 0, 11))
            .arg("subcmd", PLAIN)
            .arg("extraargs", ArgKind::StringList)
            .visibility(Visibility::Debug)
            .doc(
                "debugging and internals",
                "The C<debug> command exposes some internals of the daemon.",
            ),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Daemon-side actions
// ══════════════════════════════════════════════════════════════════════════════

fn daemon_actions() -> Vec<Action> {
    vec![
        Action::new("mount", Return::Err, v(1, 0, 3))
            .arg("mountable", DEVICE)
            .arg("mountpoint", PATH)
            .doc(
                "mount a guest disk at a position in the filesystem",
                "Mount a guest disk at a position in the filesystem.\n\
                 \n\
                 The first argument is a device or partition, the second the \
                 mountpoint, which must already exist.",
            ),
        Action::new("mount_options", Return::Err, v(1, 0, 10))
            .arg("options", PLAIN)
            .arg("mountable", DEVICE)
            .arg("mountpoint", PATH)
            .doc(
                "mount a guest disk with mount options",
                "This is the same as C<mount>, but it allows you to set the mount \
                 options as for the L<mount(8)> I<-o> flag.",
            ),
        Action::new("ls", Return::StringList(s("listing")), v(1, 0, 4))
            .arg("directory", PATH)
            .doc(
                "list the files in a directory",
                "List the files in F<directory> (relative to the root directory). \
                 The C<.> and C<..> entries are not returned.",
            ),
        Action::new("cat", Return::String(s("content")), v(1, 0, 4))
            .arg("path", PATH)
            .doc(
                "list the contents of a file",
                "Return the contents of the file named C<path>.\n\
                 \n\
                 Because of the null terminator this cannot return binary \
                 content; use C<read_file> for that.",
            ),
        Action::new("read_file", Return::BufferOut(s("content")), v(1, 0, 63))
            .arg("path", PATH)
            .doc(
                "read a file",
                "This calls returns the contents of the file C<path> as a buffer.",
            ),
        Action::new("write", Return::Err, v(1, 3, 14))
            .arg("path", PATH)
            .arg("content", ArgKind::BufferIn)
            .doc(
                "create a new file",
                "This call creates a file called C<path>. The content of the file \
                 is the string C<content> (which can contain any 8 bit data).",
            ),
        Action::new("upload", Return::Err, v(1, 0, 2))
            .arg("filename", FILE_IN)
            .arg("remotefilename", PATH)
            .doc(
                "upload a file from the local machine",
                "Upload local file F<filename> to F<remotefilename> on the filesystem.",
            ),
        Action::new("download", Return::Err, v(1, 0, 2))
            .arg("remotefilename", PATH)
            .arg("filename", FILE_OUT)
            .doc(
                "download a file to the local machine",
                "Download file F<remotefilename> and save it as F<filename> on the \
                 local machine.",
            ),
        Action::new("statns", one("statbuf", "statns"), v(1, 27, 53))
            .arg("path", PATH)
            .doc(
                "get file information",
                "Returns file information for the given C<path>.",
            ),
        Action::new("lstatnslist", many("statbufs", "statns"), v(1, 27, 53))
            .arg("path", PATH)
            .arg("names", ArgKind::StringList)
            .doc(
                "lstat on multiple files",
                "This call allows you to perform the C<lstatns> operation on \
                 multiple files, where all files are in the directory C<path>. \
                 C<names> is the list of files from this directory.",
            ),
        Action::new("readdir", many("entries", "dirent"), v(1, 0, 55))
            .arg("dir", PATH)
            .doc(
                "read directories entries",
                "This returns the list of directory entries in directory C<dir>.",
            ),
        Action::new("getxattrs", many("xattrs", "xattr"), v(1, 0, 59))
            .arg("path", PATH)
            .doc(
                "list extended attributes of a file or directory",
                "This call lists the extended attributes of the file or directory \
                 C<path>.",
            ),
        Action::new("pvs_full", many("physvols", "lvm_pv"), v(1, 0, 4)).doc(
            "list the LVM physical volumes (PVs)",
            "List all the physical volumes detected. This is the equivalent of \
             the L<pvs(8)> command. The \"full\" version includes all fields.",
        ),
        Action::new("lvs_full", many("logvols", "lvm_lv"), v(1, 0, 4)).doc(
            "list the LVM logical volumes (LVs)",
            "List all the logical volumes detected. The percentage fields are \
             -1 when not applicable.",
        ),
        Action::new("part_list", many("partitions", "partition"), v(1, 0, 78))
            .arg("device", DEVICE)
            .doc(
                "list partitions on a device",
                "This command parses the partition table on C<device> and returns \
                 the list of partitions found.",
            ),
        Action::new("inotify_read", many("events", "inotify_event"), v(1, 0, 66)).doc(
            "return list of inotify events",
            "Return the complete queue of events that have happened since the \
             previous read call.",
        ),
        Action::new(
            "btrfs_subvolume_list",
            many("subvolumes", "btrfssubvolume"),
            v(1, 17, 35),
        )
        .arg("fs", DEVICE)
        .doc(
            "list btrfs snapshots and subvolumes",
            "List the btrfs snapshots and subvolumes of the btrfs filesystem \
             which is mounted at C<fs>.",
        ),
        Action::new("utsname", one("uts", "utsname"), v(1, 19, 27)).doc(
            "appliance kernel version",
            "This returns the kernel version of the appliance.",
        ),
        Action::new("filesize", Return::Int64(s("size")), v(1, 0, 82))
            .arg("file", PATH)
            .doc(
                "return the size of the file in bytes",
                "This command returns the size of F<file> in bytes.",
            ),
        Action::new("blockdev_getss", Return::Int(s("sectorsize")), v(1, 0, 3))
            .arg("device", DEVICE)
            .doc(
                "get sectorsize of block device",
                "This returns the size of sectors on a block device.",
            ),
        Action::new("is_dir", Return::Bool(s("dirflag")), v(1, 0, 8))
            .arg("path", PATH)
            .optarg("followsymlinks", OptArgKind::Bool, 0)
            .doc(
                "test if a directory",
                "This returns C<true> if and only if there is a directory with the \
                 given C<path> name.",
            ),
        Action::new("vfs_label", Return::String(s("label")), v(1, 3, 18))
            .arg("mountable", DEVICE)
            .doc(
                "get the filesystem label",
                "This returns the label of the filesystem on C<mountable>.",
            ),
        Action::new("luks_open", Return::Err, v(1, 5, 1))
            .arg("device", DEVICE)
            .arg("key", KEY)
            .arg("mapname", PLAIN)
            .doc(
                "open a LUKS-encrypted block device",
                "This command opens a block device which has been encrypted \
                 according to the Linux Unified Key Setup (LUKS) standard.",
            ),
        Action::new("vg_activate", Return::Err, v(1, 0, 26))
            .arg("activate", ArgKind::Bool)
            .arg("volgroups", ArgKind::StringList)
            .doc(
                "activate or deactivate some volume groups",
                "This command activates or (if C<activate> is false) deactivates \
                 all logical volumes in the listed volume groups C<volgroups>.",
            ),
        Action::new("mkfs", Return::Err, v(1, 0, 8))
            .arg("fstype", PLAIN)
            .arg("device", DEVICE)
            .optarg("blocksize", OptArgKind::Int, 0)
            .optarg("features", OptArgKind::String, 1)
            .optarg("inode", OptArgKind::Int, 2)
            .optarg("sectorsize", OptArgKind::Int, 3)
            .optarg("label", OptArgKind::String, 4)
            .doc(
                "make a filesystem",
                "This function creates a filesystem on C<device>. The filesystem \
                 type is C<fstype>, for example C<ext3>.",
            ),
        Action::new("md_create", Return::Err, v(1, 15, 6))
            .arg("name", PLAIN)
            .arg("devices", ArgKind::DeviceList)
            .optarg("missingbitmap", OptArgKind::Int64, 0)
            .optarg("nrdevices", OptArgKind::Int, 1)
            .optarg("spare", OptArgKind::Int, 2)
            .optarg("chunk", OptArgKind::Int64, 3)
            .optarg("level", OptArgKind::String, 4)
            .doc(
                "create a Linux md (RAID) device",
                "Create a Linux md (RAID) device named C<name> on the devices in \
                 the list C<devices>.",
            ),
        Action::new("aug_defnode", one("nrnodescreated", "int_bool"), v(1, 0, 7))
            .arg("name", PLAIN)
            .arg("expr", PLAIN)
            .arg("val", ArgKind::OptString)
            .doc(
                "define an Augeas node",
                "Defines a variable C<name> whose value is the result of evaluating \
                 C<expr>.",
            ),
        Action::new("copy_device_to_device", Return::Err, v(1, 13, 25))
            .arg("src", DEVICE)
            .arg("dest", DEVICE)
            .optarg("srcoffset", OptArgKind::Int64, 0)
            .optarg("destoffset", OptArgKind::Int64, 1)
            .optarg("size", OptArgKind::Int64, 2)
            .optarg("sparse", OptArgKind::Bool, 3)
            .doc(
                "copy from source device to destination device",
                "The four calls C<copy_device_to_device>, C<copy_device_to_file>, \
                 C<copy_file_to_device>, and C<copy_file_to_file> let you copy from \
                 a source to a destination.",
            ),
        Action::new("dd", Return::Err, v(1, 0, 80))
            .arg("src", DEVICE)
            .arg("dest", DEVICE)
            .deprecated(Deprecation::ReplacedBy(s("copy_device_to_device")))
            .doc(
                "copy from source to destination using dd",
                "This command copies from one source device or file C<src> to \
                 another destination device or file C<dest>.",
            ),
        Action::new("set_selinux", Return::Err, v(1, 0, 67))
            .arg("selinux", ArgKind::Bool)
            .deprecated(Deprecation::NoReplacement)
            .doc(
                "set SELinux enabled or disabled at appliance boot",
                "This sets the selinux flag that is passed to the appliance at \
                 boot time.",
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StructRegistry, StructUsage};
    use std::collections::HashSet;

    #[test]
    fn builtin_catalog_is_valid() {
        let cat = catalog().unwrap();
        assert!(cat.actions().len() > 40);
    }

    #[test]
    fn covers_every_return_style() {
        let cat = catalog().unwrap();
        let styles: HashSet<&str> = cat
            .actions()
            .iter()
            .map(|a| match &a.ret {
                Return::Err => "err",
                Return::Int(_) => "int",
                Return::Int64(_) => "int64",
                Return::Bool(_) => "bool",
                Return::ConstString(_) => "const_string",
                Return::ConstOptString(_) => "const_opt_string",
                Return::String(_) => "string",
                Return::StringList(_) => "string_list",
                Return::Hashtable(_) => "hashtable",
                Return::Struct { .. } => "struct",
                Return::StructList { .. } => "struct_list",
                Return::BufferOut(_) => "buffer_out",
            })
            .collect();
        assert_eq!(styles.len(), 12);
    }

    #[test]
    fn covers_every_field_kind() {
        let kinds: HashSet<FieldKind> = structs()
            .iter()
            .flat_map(|d| d.fields.iter().map(|f| f.kind))
            .collect();
        assert_eq!(kinds.len(), 10);
    }

    #[test]
    fn statns_is_used_both_ways() {
        let cat = catalog().unwrap();
        let reg = StructRegistry::build(&cat);
        assert_eq!(reg.usage("statns"), Some(StructUsage::Both));
        assert_eq!(reg.usage("version"), Some(StructUsage::SingletonOnly));
        assert_eq!(reg.usage("xattr"), Some(StructUsage::ListOnly));
    }
}
