//! # ICO 目录结构模块
//!
//! ## 设计思路
//!
//! ICO 文件由 6 字节 ICONDIR 头、每个条目 16 字节的 ICONDIRENTRY 以及紧随其后的
//! 图像数据组成，所有整数均为小端序。宽/高字节为 0 表示 256。
//!
//! 写入侧只负责序列化编码器算好的目录项；解析侧用于回读校验与 `inspect` 命令，
//! 会检查保留字段、资源类型以及每个数据区间是否落在文件内。

use super::IconError;

/// ICONDIR 头长度。
pub const ICONDIR_SIZE: usize = 6;
/// 单个 ICONDIRENTRY 长度。
pub const ICONDIRENTRY_SIZE: usize = 16;
/// 资源类型：图标。
pub const RESOURCE_TYPE_ICON: u16 = 1;

/// 单个目录项，宽高为实际像素值（1~256）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcoDirectoryEntry {
    pub width: u32,
    pub height: u32,
    /// 调色板颜色数，0 表示无调色板或 256 色。
    pub color_count: u8,
    pub planes: u16,
    pub bits_per_pixel: u16,
    /// 图像数据长度。
    pub bytes_in_res: u32,
    /// 图像数据在文件中的偏移。
    pub image_offset: u32,
}

impl IcoDirectoryEntry {
    /// 数据区结束位置（不含）。
    pub fn end_offset(&self) -> u64 {
        u64::from(self.image_offset) + u64::from(self.bytes_in_res)
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.push(dimension_to_byte(self.width));
        out.push(dimension_to_byte(self.height));
        out.push(self.color_count);
        out.push(0);
        out.extend_from_slice(&self.planes.to_le_bytes());
        out.extend_from_slice(&self.bits_per_pixel.to_le_bytes());
        out.extend_from_slice(&self.bytes_in_res.to_le_bytes());
        out.extend_from_slice(&self.image_offset.to_le_bytes());
    }

    fn parse(raw: &[u8]) -> Result<Self, IconError> {
        if raw.len() < ICONDIRENTRY_SIZE {
            return Err(IconError::Decode("ICONDIRENTRY 长度不足".to_string()));
        }
        if raw[3] != 0 {
            return Err(IconError::Decode(format!(
                "ICONDIRENTRY 保留字段必须为 0（实际：{}）",
                raw[3]
            )));
        }

        Ok(Self {
            width: dimension_from_byte(raw[0]),
            height: dimension_from_byte(raw[1]),
            color_count: raw[2],
            planes: read_u16(raw, 4),
            bits_per_pixel: read_u16(raw, 6),
            bytes_in_res: read_u32(raw, 8),
            image_offset: read_u32(raw, 12),
        })
    }
}

/// 写入 ICONDIR 头。
pub(crate) fn write_header(out: &mut Vec<u8>, count: u16) {
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&RESOURCE_TYPE_ICON.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
}

/// 已解析的 ICO 目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcoDirectory {
    resource_type: u16,
    entries: Vec<IcoDirectoryEntry>,
}

impl IcoDirectory {
    /// 解析 ICO 字节流的目录部分并校验数据区间。
    pub fn parse(bytes: &[u8]) -> Result<Self, IconError> {
        if bytes.len() < ICONDIR_SIZE {
            return Err(IconError::Decode(format!(
                "ICO 数据过短：{} 字节",
                bytes.len()
            )));
        }

        let reserved = read_u16(bytes, 0);
        if reserved != 0 {
            return Err(IconError::Decode(format!(
                "ICONDIR 保留字段必须为 0（实际：{}）",
                reserved
            )));
        }

        let resource_type = read_u16(bytes, 2);
        if resource_type != RESOURCE_TYPE_ICON {
            return Err(IconError::Decode(format!(
                "不是图标资源（类型：{}）",
                resource_type
            )));
        }

        let count = usize::from(read_u16(bytes, 4));
        let table_end = ICONDIR_SIZE + count * ICONDIRENTRY_SIZE;
        if bytes.len() < table_end {
            return Err(IconError::Decode(format!(
                "目录声明 {} 个条目，但数据只有 {} 字节",
                count,
                bytes.len()
            )));
        }

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let start = ICONDIR_SIZE + index * ICONDIRENTRY_SIZE;
            let entry = IcoDirectoryEntry::parse(&bytes[start..start + ICONDIRENTRY_SIZE])?;

            if u64::from(entry.image_offset) < table_end as u64 || entry.end_offset() > bytes.len() as u64 {
                return Err(IconError::Decode(format!(
                    "第 {} 个条目的数据区间越界：offset={} size={}",
                    index, entry.image_offset, entry.bytes_in_res
                )));
            }
            entries.push(entry);
        }

        Ok(Self {
            resource_type,
            entries,
        })
    }

    pub fn resource_type(&self) -> u16 {
        self.resource_type
    }

    pub fn entries(&self) -> &[IcoDirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 取出第 `index` 个条目的数据。
    pub fn payload<'a>(&self, bytes: &'a [u8], index: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(index)?;
        let start = usize::try_from(entry.image_offset).ok()?;
        let end = usize::try_from(entry.end_offset()).ok()?;
        bytes.get(start..end)
    }

    /// 所有数据区中最靠后的结束位置。
    pub fn end_offset(&self) -> u64 {
        self.entries
            .iter()
            .map(IcoDirectoryEntry::end_offset)
            .max()
            .unwrap_or(ICONDIR_SIZE as u64)
    }
}

fn dimension_to_byte(value: u32) -> u8 {
    if value >= 256 { 0 } else { value as u8 }
}

fn dimension_from_byte(value: u8) -> u32 {
    if value == 0 { 256 } else { u32::from(value) }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(size: u32, offset: u32, len: u32) -> IcoDirectoryEntry {
        IcoDirectoryEntry {
            width: size,
            height: size,
            color_count: 0,
            planes: 1,
            bits_per_pixel: 32,
            bytes_in_res: len,
            image_offset: offset,
        }
    }

    #[test]
    fn entry_encodes_256_as_zero() {
        let mut out = Vec::new();
        sample_entry(256, 22, 10).write_to(&mut out);
        assert_eq!(out.len(), ICONDIRENTRY_SIZE);
        assert_eq!(&out[..4], &[0, 0, 0, 0]);
        assert_eq!(&out[4..8], &[1, 0, 32, 0]);
        assert_eq!(&out[8..12], &10u32.to_le_bytes());
        assert_eq!(&out[12..16], &22u32.to_le_bytes());
    }

    #[test]
    fn parse_reads_back_written_directory() {
        let mut bytes = Vec::new();
        write_header(&mut bytes, 2);
        sample_entry(16, 38, 4).write_to(&mut bytes);
        sample_entry(256, 42, 3).write_to(&mut bytes);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7]);

        let directory = IcoDirectory::parse(&bytes).expect("directory should parse");
        assert_eq!(directory.resource_type(), RESOURCE_TYPE_ICON);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.entries()[1].width, 256);
        assert_eq!(directory.payload(&bytes, 0), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(directory.payload(&bytes, 1), Some(&[5u8, 6, 7][..]));
        assert_eq!(directory.end_offset(), bytes.len() as u64);
    }

    #[test]
    fn parse_rejects_cursor_and_garbage() {
        assert!(matches!(IcoDirectory::parse(&[0, 0, 2, 0, 0, 0]), Err(IconError::Decode(_))));
        assert!(matches!(IcoDirectory::parse(&[1, 0, 1, 0, 0, 0]), Err(IconError::Decode(_))));
        assert!(matches!(IcoDirectory::parse(b"PNG"), Err(IconError::Decode(_))));
    }

    #[test]
    fn parse_rejects_out_of_bounds_payload() {
        let mut bytes = Vec::new();
        write_header(&mut bytes, 1);
        sample_entry(16, 22, 100).write_to(&mut bytes);
        bytes.extend_from_slice(&[0; 10]);

        assert!(matches!(IcoDirectory::parse(&bytes), Err(IconError::Decode(_))));
    }

    #[test]
    fn empty_directory_is_valid() {
        let mut bytes = Vec::new();
        write_header(&mut bytes, 0);
        let directory = IcoDirectory::parse(&bytes).expect("empty directory parses");
        assert!(directory.is_empty());
        assert_eq!(directory.end_offset(), ICONDIR_SIZE as u64);
    }
}
