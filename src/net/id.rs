//! 标识符类型
//!
//! 定义设备、线缆与端口的标识。

/// 设备标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub usize);

/// 线缆标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CableId(pub usize);

/// 端口引用：设备 + 设备内端口序号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub device: DeviceId,
    pub port: usize,
}
