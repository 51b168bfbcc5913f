//! Splat record decoding and encoding

use glam::{Quat, Vec3};

use crate::core::{Error, Result};

/// Bytes per splat record
pub const SPLAT_RECORD_SIZE: usize = 32;

/// Identity quaternion in the record's i8 encoding (x, y, z, w)
pub const IDENTITY_ROTATION: [i8; 4] = [0, 0, 0, 127];

/// A fully decoded splat record, every field retained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplatRecord {
    pub position: Vec3,
    pub scale: Vec3,
    /// RGBA, 0-255
    pub color: [u8; 4],
    /// Quaternion x, y, z, w in -127..=127
    pub rotation: [i8; 4],
}

impl SplatRecord {
    /// Opaque, unrotated splat
    pub fn point(position: Vec3, scale: Vec3, rgb: [u8; 3]) -> Self {
        Self {
            position,
            scale,
            color: [rgb[0], rgb[1], rgb[2], 255],
            rotation: IDENTITY_ROTATION,
        }
    }

    /// Render size: mean of the three scale components
    pub fn size(&self) -> f32 {
        (self.scale.x + self.scale.y + self.scale.z) / 3.0
    }

    /// Normalized RGB
    pub fn rgb(&self) -> [f32; 3] {
        [
            self.color[0] as f32 / 255.0,
            self.color[1] as f32 / 255.0,
            self.color[2] as f32 / 255.0,
        ]
    }

    pub fn alpha(&self) -> f32 {
        self.color[3] as f32 / 255.0
    }

    /// Rotation as a unit quaternion
    pub fn rotation_quat(&self) -> Quat {
        let [x, y, z, w] = self.rotation.map(|c| c as f32 / 127.0);
        let q = Quat::from_xyzw(x, y, z, w);
        if q.length_squared() > 0.0 { q.normalize() } else { Quat::IDENTITY }
    }

    fn read(bytes: &[u8]) -> Self {
        let f = |offset: usize| {
            f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
        };

        Self {
            position: Vec3::new(f(0), f(4), f(8)),
            scale: Vec3::new(f(12), f(16), f(20)),
            color: [bytes[24], bytes[25], bytes[26], bytes[27]],
            rotation: [
                bytes[28] as i8,
                bytes[29] as i8,
                bytes[30] as i8,
                bytes[31] as i8,
            ],
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        for value in self.position.to_array().into_iter().chain(self.scale.to_array()) {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.color);
        out.extend(self.rotation.map(|c| c as u8));
    }
}

/// Render-ready attribute buffers for one segment.
///
/// `positions` and `colors` hold three floats per splat, `sizes` one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplatPayload {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
}

impl SplatPayload {
    pub fn with_capacity(splat_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(splat_count * 3),
            colors: Vec::with_capacity(splat_count * 3),
            sizes: Vec::with_capacity(splat_count),
        }
    }

    /// Append one splat
    pub fn push(&mut self, position: Vec3, rgb: [f32; 3], size: f32) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&rgb);
        self.sizes.push(size);
    }

    pub fn splat_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * 3..index * 3 + 3])
    }

    pub fn color(&self, index: usize) -> [f32; 3] {
        [
            self.colors[index * 3],
            self.colors[index * 3 + 1],
            self.colors[index * 3 + 2],
        ]
    }

    /// Position buffer as raw bytes for GPU upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Color buffer as raw bytes for GPU upload
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Size buffer as raw bytes for GPU upload
    pub fn size_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }

    /// Axis-aligned bounds of all positions, `None` when empty
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.positions.chunks_exact(3).map(Vec3::from_slice);
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Approximate heap footprint in bytes
    pub fn memory_bytes(&self) -> usize {
        (self.positions.len() + self.colors.len() + self.sizes.len()) * std::mem::size_of::<f32>()
    }
}

fn check_len(bytes: &[u8]) -> Result<usize> {
    if bytes.len() % SPLAT_RECORD_SIZE != 0 {
        return Err(Error::MalformedPayload { len: bytes.len() });
    }
    Ok(bytes.len() / SPLAT_RECORD_SIZE)
}

/// Decode a `.splat` buffer into render attributes.
///
/// An empty buffer yields an empty payload. Alpha and rotation are dropped.
pub fn decode(bytes: &[u8]) -> Result<SplatPayload> {
    let count = check_len(bytes)?;
    let mut payload = SplatPayload::with_capacity(count);

    for chunk in bytes.chunks_exact(SPLAT_RECORD_SIZE) {
        let record = SplatRecord::read(chunk);
        payload.push(record.position, record.rgb(), record.size());
    }

    Ok(payload)
}

/// Decode a `.splat` buffer keeping every field of every record.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<SplatRecord>> {
    check_len(bytes)?;
    Ok(bytes.chunks_exact(SPLAT_RECORD_SIZE).map(SplatRecord::read).collect())
}

/// Encode records into the `.splat` layout, bit-exact.
pub fn encode(records: &[SplatRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * SPLAT_RECORD_SIZE);
    for record in records {
        record.write(&mut out);
    }
    out
}

/// Encode render attributes back into `.splat` records.
///
/// Colors are rounded to bytes, the size is written to all three scale
/// axes, alpha is opaque and rotation is the identity.
pub fn encode_payload(payload: &SplatPayload) -> Vec<u8> {
    let records: Vec<SplatRecord> = (0..payload.splat_count())
        .map(|i| {
            let rgb = payload.color(i).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            SplatRecord::point(payload.position(i), Vec3::splat(payload.sizes[i]), rgb)
        })
        .collect();
    encode(&records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SplatRecord {
        SplatRecord {
            position: Vec3::new(1.5, -2.25, 40.0),
            scale: Vec3::new(0.1, 0.2, 0.3),
            color: [255, 128, 0, 200],
            rotation: [0, -127, 64, 127],
        }
    }

    #[test]
    fn test_record_layout() {
        let bytes = encode(&[sample_record()]);
        assert_eq!(bytes.len(), SPLAT_RECORD_SIZE);

        assert_eq!(&bytes[0..4], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &(-2.25f32).to_le_bytes());
        assert_eq!(&bytes[8..12], &40.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &0.1f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &0.3f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &[255, 128, 0, 200]);
        assert_eq!(bytes[28], 0);
        assert_eq!(bytes[29], 0x81); // -127
        assert_eq!(bytes[30], 64);
        assert_eq!(bytes[31], 127);
    }

    #[test]
    fn test_decode_single_record() {
        let bytes = encode(&[sample_record()]);
        let payload = decode(&bytes).expect("decode failed");

        assert_eq!(payload.splat_count(), 1);
        assert_eq!(payload.positions, vec![1.5, -2.25, 40.0]);
        assert!((payload.sizes[0] - 0.2).abs() < 1e-6);
        assert_eq!(payload.colors, vec![1.0, 128.0 / 255.0, 0.0]);
    }

    #[test]
    fn test_decode_records_keeps_everything() {
        let records = vec![sample_record(), SplatRecord::point(Vec3::ONE, Vec3::splat(0.5), [1, 2, 3])];
        let decoded = decode_records(&encode(&records)).expect("decode failed");
        assert_eq!(decoded, records);
        assert_eq!(decoded[1].rotation, IDENTITY_ROTATION);
        assert_eq!(decoded[1].color[3], 255);
    }

    #[test]
    fn test_empty_buffer_is_empty_payload() {
        let payload = decode(&[]).expect("empty decode should succeed");
        assert!(payload.is_empty());
        assert_eq!(payload.splat_count(), 0);
        assert!(payload.bounds().is_none());
    }

    #[test]
    fn test_misaligned_buffer_is_malformed() {
        let result = decode(&[0u8; 17]);
        assert!(matches!(result, Err(Error::MalformedPayload { len: 17 })));

        let result = decode_records(&[0u8; 65]);
        assert!(matches!(result, Err(Error::MalformedPayload { len: 65 })));
    }

    #[test]
    fn test_payload_roundtrip_precision() {
        let mut payload = SplatPayload::default();
        payload.push(Vec3::new(0.123456, 7.0e-8, -1234.5678), [0.1, 0.5, 0.9], 0.25);
        payload.push(Vec3::new(f32::MAX, -0.0, 3.0), [0.0, 1.0, 0.333], 0.1);

        let decoded = decode(&encode_payload(&payload)).expect("decode failed");

        assert_eq!(decoded.splat_count(), 2);
        assert_eq!(decoded.positions, payload.positions);
        for (a, b) in decoded.sizes.iter().zip(&payload.sizes) {
            assert!((a - b).abs() < 1e-6);
        }
        for (a, b) in decoded.colors.iter().zip(&payload.colors) {
            assert!((a - b).abs() <= 1.0 / 255.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_rotation_quat() {
        let record = SplatRecord::point(Vec3::ZERO, Vec3::ONE, [0, 0, 0]);
        assert!(record.rotation_quat().abs_diff_eq(Quat::IDENTITY, 1e-6));

        let zero = SplatRecord { rotation: [0, 0, 0, 0], ..record };
        assert_eq!(zero.rotation_quat(), Quat::IDENTITY);
    }

    #[test]
    fn test_byte_views_for_upload() {
        let mut payload = SplatPayload::default();
        payload.push(Vec3::new(1.0, 2.0, 3.0), [0.0, 0.5, 1.0], 0.2);

        assert_eq!(payload.position_bytes().len(), 12);
        assert_eq!(payload.color_bytes().len(), 12);
        assert_eq!(payload.size_bytes().len(), 4);
        assert_eq!(payload.memory_bytes(), 28);
    }

    #[test]
    fn test_bounds() {
        let mut payload = SplatPayload::default();
        payload.push(Vec3::new(1.0, -2.0, 3.0), [0.0; 3], 0.1);
        payload.push(Vec3::new(-1.0, 5.0, 0.0), [0.0; 3], 0.1);

        let (min, max) = payload.bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 5.0, 3.0));
    }
}
