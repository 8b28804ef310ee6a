//! Target platform and architecture description
//!
//! The arch table drives pointer size, endianness and the names the
//! external toolchain stages expect for each architecture.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Target operating system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Darwin,
}

impl Platform {
    /// Parse a platform name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(Platform::Linux),
            "darwin" | "macos" => Some(Platform::Darwin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
        }
    }

    /// The platform this build of the driver is running on
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Darwin
        } else {
            Platform::Linux
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target CPU architecture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    X86,
    Arm,
    Aarch64,
}

/// Per-architecture facts consumed by the toolchain stages
#[derive(Debug, Clone, Copy)]
pub struct ArchInfo {
    /// Pointer size in bits
    pub pointer_size: u32,
    /// Whether the architecture is little-endian
    pub little_endian: bool,
    /// Architecture name the object emitter expects (`-march=`)
    pub objgen_name: &'static str,
    /// Architecture name the linker expects (`-arch`)
    pub linker_name: &'static str,
}

static ARCH_ALIASES: Lazy<HashMap<&'static str, Arch>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("x86-64", Arch::X86_64);
    m.insert("x86_64", Arch::X86_64);
    m.insert("amd64", Arch::X86_64);
    m.insert("x64", Arch::X86_64);
    m.insert("x86", Arch::X86);
    m.insert("i386", Arch::X86);
    m.insert("ia32", Arch::X86);
    m.insert("arm", Arch::Arm);
    m.insert("aarch64", Arch::Aarch64);
    m.insert("arm64", Arch::Aarch64);
    m
});

impl Arch {
    /// Parse an architecture name, accepting common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        ARCH_ALIASES.get(name).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86-64",
            Arch::X86 => "x86",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Facts about this architecture
    pub fn info(&self) -> ArchInfo {
        match self {
            Arch::X86_64 => ArchInfo {
                pointer_size: 64,
                little_endian: true,
                objgen_name: "x86-64",
                linker_name: "x86_64",
            },
            Arch::X86 => ArchInfo {
                pointer_size: 32,
                little_endian: true,
                objgen_name: "x86",
                linker_name: "i386",
            },
            Arch::Arm => ArchInfo {
                pointer_size: 32,
                little_endian: true,
                objgen_name: "arm",
                linker_name: "armv7",
            },
            Arch::Aarch64 => ArchInfo {
                pointer_size: 64,
                little_endian: true,
                objgen_name: "aarch64",
                linker_name: "aarch64",
            },
        }
    }

    /// The architecture this build of the driver is running on
    pub fn host() -> Self {
        if cfg!(target_arch = "x86_64") {
            Arch::X86_64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else {
            Arch::Aarch64
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The target a build is generating code for, immutable for the duration
/// of a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetConfig {
    pub platform: Platform,
    pub arch: Arch,
}

impl TargetConfig {
    pub fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// The host target (default when no target is configured)
    pub fn host() -> Self {
        Self::new(Platform::host(), Arch::host())
    }

    /// Resolve one of the named target presets
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "linux_amd64" => Some(Self::new(Platform::Linux, Arch::X86_64)),
            "osx" => Some(Self::new(Platform::Darwin, Arch::X86_64)),
            "sim" => Some(Self::new(Platform::Darwin, Arch::X86)),
            "dev" => Some(Self::new(Platform::Darwin, Arch::Arm)),
            _ => None,
        }
    }

    /// Pointer size in bits
    pub fn pointer_size(&self) -> u32 {
        self.arch.info().pointer_size
    }

    /// Whether the target is little-endian
    pub fn little_endian(&self) -> bool {
        self.arch.info().little_endian
    }

    /// `platform-arch` key used by per-target manifest tables
    pub fn key(&self) -> String {
        format!("{}-{}", self.platform, self.arch)
    }
}

impl fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform, self.arch)
    }
}
