//! Icon image sequences for image records
//!
//! An icon is a square 8-bit MONOCHROME2 image. Sources are tried in order:
//! an external PGM file named after the source file, a frame of the dataset's
//! own pixel data, the configured default PGM, and finally an all-black image.
//! Pixel data in any transfer syntax the registry can decode is accepted.

use super::DirectoryRecord;
use crate::dataset::tags::*;
use crate::error::{DicomdirError, Result};
use crate::types::{IconOptions, MAX_ICON_SIZE, MIN_ICON_SIZE};
use dicom_core::value::{PrimitiveValue, Value};
use dicom_core::VR;
use dicom_object::mem::InMemElement;
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::{debug, warn};
use std::path::Path;

/// Where an attached icon came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    External,
    Frame,
    Default,
    /// No usable source; the icon is all black
    Black,
}

impl IconSource {
    /// Returns whether the icon shows actual image content
    pub fn is_real(&self) -> bool {
        !matches!(self, IconSource::Black)
    }
}

/// Creates icon image sequences
pub struct IconGenerator<'a> {
    options: &'a IconOptions,
}

impl<'a> IconGenerator<'a> {
    pub fn new(options: &'a IconOptions) -> Self {
        Self { options }
    }

    /// Attaches an IconImageSequence of `size` x `size` pixels to the record
    ///
    /// Falls back to a black icon when no source is usable. On failure the
    /// record is left without an icon.
    pub fn attach(
        &self,
        record: &mut DirectoryRecord,
        ds: &InMemDicomObject,
        source_path: &Path,
        transfer_syntax_uid: &str,
        size: u32,
    ) -> Result<IconSource> {
        let result = self.try_attach(record, ds, source_path, transfer_syntax_uid, size);
        if result.is_err() {
            record.attributes.remove_element(ICON_IMAGE_SEQUENCE);
        }
        result
    }

    fn try_attach(
        &self,
        record: &mut DirectoryRecord,
        ds: &InMemDicomObject,
        source_path: &Path,
        transfer_syntax_uid: &str,
        size: u32,
    ) -> Result<IconSource> {
        if !(MIN_ICON_SIZE..=MAX_ICON_SIZE).contains(&size) {
            return Err(DicomdirError::Icon(format!(
                "icon size {} out of range [{}, {}]",
                size, MIN_ICON_SIZE, MAX_ICON_SIZE
            )));
        }

        let (pixels, source) = match self.external_icon(source_path) {
            Some(image) => (scaled(&image, size), IconSource::External),
            None => match frame_image(ds, transfer_syntax_uid) {
                Some(image) => (scaled(&image, size), IconSource::Frame),
                None => match self.default_icon() {
                    Some(image) => (scaled(&image, size), IconSource::Default),
                    None => (vec![0; (size * size) as usize], IconSource::Black),
                },
            },
        };

        if pixels.len() != (size * size) as usize {
            return Err(DicomdirError::Icon(format!(
                "icon has {} pixels, expected {}",
                pixels.len(),
                size * size
            )));
        }
        put_sequence(
            &mut record.attributes,
            ICON_IMAGE_SEQUENCE,
            vec![icon_item(size as u16, pixels)],
        );
        Ok(source)
    }

    fn external_icon(&self, source_path: &Path) -> Option<DynamicImage> {
        let prefix = self.options.prefix.as_ref()?;
        let name = source_path.file_name()?.to_string_lossy();
        let path = format!("{}{}", prefix, name);
        let bytes = std::fs::read(&path).ok()?;
        match read_pgm(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("cannot read icon file {}: {}", path, e);
                None
            }
        }
    }

    fn default_icon(&self) -> Option<DynamicImage> {
        let path = self.options.default_icon.as_ref()?;
        let loaded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| read_pgm(&bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("cannot read default icon {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Decodes a PGM (PNM family) image
fn read_pgm(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Pnm)
}

/// Resamples to a `size` x `size` grayscale raster
fn scaled(image: &DynamicImage, size: u32) -> Vec<u8> {
    image
        .resize_exact(size, size, FilterType::Nearest)
        .to_luma8()
        .into_raw()
}

/// Decodes the representative frame of the dataset's pixel data
///
/// MONOCHROME1 data comes back inverted and colour data is reduced to
/// luminance. Returns `None` when the transfer syntax cannot be decoded or
/// the image attributes are incomplete.
fn frame_image(ds: &InMemDicomObject, transfer_syntax_uid: &str) -> Option<DynamicImage> {
    let pixel_data = ds.element(PIXEL_DATA).ok()?;
    if !element_has_value(pixel_data) {
        return None;
    }
    let frames = get_int_value(ds, NUMBER_OF_FRAMES).unwrap_or(1).max(1) as usize;
    let index = (representative_frame(ds, frames) - 1) as u32;

    // native pixel data must hold the whole frame
    if let Value::Primitive(value) = pixel_data.value() {
        let frame_len = get_u16_value(ds, ROWS)? as usize
            * get_u16_value(ds, COLUMNS)? as usize
            * get_u16_value(ds, SAMPLES_PER_PIXEL).unwrap_or(1) as usize
            * (get_u16_value(ds, BITS_ALLOCATED)? as usize).div_ceil(8);
        if value.to_bytes().len() < (index as usize + 1) * frame_len {
            debug!("pixel data too short for frame {}", index + 1);
            return None;
        }
    }

    let file = match ds
        .clone()
        .with_meta(FileMetaTableBuilder::new().transfer_syntax(transfer_syntax_uid))
    {
        Ok(file) => file,
        Err(e) => {
            debug!("cannot prepare pixel data for decoding: {}", e);
            return None;
        }
    };
    let decoded = match file.decode_pixel_data_frame(index) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("cannot decode frame {} for icon: {}", index + 1, e);
            return None;
        }
    };

    // 8-bit samples are used as stored, wider ones go through the VOI LUT
    let options = if decoded.bits_allocated() == 8 {
        ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .force_8bit()
    } else {
        ConvertOptions::new().force_8bit()
    };
    match decoded.to_dynamic_image_with_options(0, &options) {
        Ok(image) => Some(image),
        Err(e) => {
            debug!("cannot convert frame {} for icon: {}", index + 1, e);
            None
        }
    }
}

/// 1-based number of the frame shown in the icon
fn representative_frame(ds: &InMemDicomObject, frames: usize) -> usize {
    match get_int_value(ds, REPRESENTATIVE_FRAME_NUMBER) {
        Some(n) if n >= 1 && (n as usize) <= frames => n as usize,
        _ if frames > 3 => frames / 3,
        _ => 1,
    }
}

fn icon_item(size: u16, pixels: Vec<u8>) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_u16(&mut item, SAMPLES_PER_PIXEL, 1);
    put_string_with_vr(&mut item, PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2");
    put_u16(&mut item, ROWS, size);
    put_u16(&mut item, COLUMNS, size);
    put_u16(&mut item, BITS_ALLOCATED, 8);
    put_u16(&mut item, BITS_STORED, 8);
    put_u16(&mut item, HIGH_BIT, 7);
    put_u16(&mut item, PIXEL_REPRESENTATION, 0);
    item.put(InMemElement::new(
        PIXEL_DATA,
        VR::OB,
        PrimitiveValue::U8(pixels.into()),
    ));
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;
    use dicom_dictionary_std::uids::EXPLICIT_VR_LITTLE_ENDIAN;
    use std::path::PathBuf;

    fn pgm(width: usize, height: usize, value: u8) -> Vec<u8> {
        let mut bytes = format!("P5\n# icon\n{} {}\n255\n", width, height).into_bytes();
        bytes.extend(std::iter::repeat(value).take(width * height));
        bytes
    }

    fn image_attributes(
        photometric: &str,
        samples: u16,
        rows: u16,
        columns: u16,
        bits: u16,
    ) -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, PHOTOMETRIC_INTERPRETATION, photometric);
        put_u16(&mut ds, SAMPLES_PER_PIXEL, samples);
        put_u16(&mut ds, ROWS, rows);
        put_u16(&mut ds, COLUMNS, columns);
        put_u16(&mut ds, BITS_ALLOCATED, bits);
        put_u16(&mut ds, BITS_STORED, bits);
        put_u16(&mut ds, HIGH_BIT, bits - 1);
        put_u16(&mut ds, PIXEL_REPRESENTATION, 0);
        ds
    }

    fn mono8(rows: u16, columns: u16, frames: usize) -> InMemDicomObject {
        let mut ds = image_attributes("MONOCHROME2", 1, rows, columns, 8);
        put_string(&mut ds, NUMBER_OF_FRAMES, &frames.to_string());
        let frame_len = rows as usize * columns as usize;
        let data: Vec<u8> = (0..frames)
            .flat_map(|f| std::iter::repeat((f * 10) as u8).take(frame_len))
            .collect();
        ds.put(InMemElement::new(PIXEL_DATA, VR::OB, PrimitiveValue::U8(data.into())));
        ds
    }

    fn icon_pixels(record: &DirectoryRecord) -> Vec<u8> {
        let item = sequence_item(&record.attributes, ICON_IMAGE_SEQUENCE, 0).unwrap();
        item.element(PIXEL_DATA).unwrap().to_bytes().unwrap().to_vec()
    }

    fn attach(
        ds: &InMemDicomObject,
        transfer_syntax_uid: &str,
        size: u32,
    ) -> (IconSource, Vec<u8>) {
        let options = IconOptions::default();
        let mut record = DirectoryRecord::new(RecordKind::Image);
        let source = IconGenerator::new(&options)
            .attach(&mut record, ds, Path::new("IMG1"), transfer_syntax_uid, size)
            .unwrap();
        (source, icon_pixels(&record))
    }

    #[test]
    fn test_read_pgm() {
        let image = read_pgm(&pgm(3, 2, 7)).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.to_luma8().into_raw(), vec![7; 6]);
        assert!(read_pgm(b"not an image").is_err());
        assert!(read_pgm(b"P5\n2 2\n255\n\x00").is_err());
    }

    #[test]
    fn test_scaling() {
        let image = read_pgm(&pgm(2, 2, 50)).unwrap();
        assert_eq!(scaled(&image, 4), vec![50; 16]);
        assert_eq!(scaled(&image, 1), vec![50]);
    }

    #[test]
    fn test_frame_choice() {
        let ds = mono8(4, 4, 9);
        assert_eq!(representative_frame(&ds, 9), 3);
        assert_eq!(representative_frame(&mono8(4, 4, 2), 2), 1);

        let mut with_number = ds.clone();
        put_string(&mut with_number, REPRESENTATIVE_FRAME_NUMBER, "5");
        assert_eq!(representative_frame(&with_number, 9), 5);
        put_string(&mut with_number, REPRESENTATIVE_FRAME_NUMBER, "12");
        assert_eq!(representative_frame(&with_number, 9), 3);
    }

    #[test]
    fn test_icon_from_frame() {
        let (source, pixels) = attach(&mono8(8, 8, 9), EXPLICIT_VR_LITTLE_ENDIAN, 4);
        assert_eq!(source, IconSource::Frame);
        // frame 3 of 9, filled with 20
        assert_eq!(pixels, vec![20; 16]);
    }

    #[test]
    fn test_monochrome1_inverted() {
        let mut ds = mono8(2, 2, 1);
        put_string(&mut ds, PHOTOMETRIC_INTERPRETATION, "MONOCHROME1");
        let (source, pixels) = attach(&ds, EXPLICIT_VR_LITTLE_ENDIAN, 2);
        assert_eq!(source, IconSource::Frame);
        assert_eq!(pixels, vec![255; 4]);
    }

    #[test]
    #[allow(deprecated)]
    fn test_icon_from_16_bit_frame() {
        use dicom_dictionary_std::uids::EXPLICIT_VR_BIG_ENDIAN;

        let mut ds = image_attributes("MONOCHROME2", 1, 4, 4, 16);
        let values: Vec<u16> = (0..16).map(|v| v * 256).collect();
        ds.put(InMemElement::new(PIXEL_DATA, VR::OW, PrimitiveValue::U16(values.into())));

        let (source, pixels) = attach(&ds, EXPLICIT_VR_BIG_ENDIAN, 4);
        assert_eq!(source, IconSource::Frame);
        assert!(pixels.windows(2).all(|w| w[0] <= w[1]), "{:?}", pixels);
        assert!(pixels[0] < pixels[15]);
    }

    #[test]
    fn test_icon_from_colour_frame() {
        let mut ds = image_attributes("RGB", 3, 2, 2, 8);
        ds.put(InMemElement::new(
            PIXEL_DATA,
            VR::OB,
            PrimitiveValue::U8(vec![100; 12].into()),
        ));
        let (source, pixels) = attach(&ds, EXPLICIT_VR_LITTLE_ENDIAN, 2);
        assert_eq!(source, IconSource::Frame);
        assert_eq!(pixels, vec![100; 4]);
    }

    #[test]
    fn test_truncated_pixel_data_gives_black_icon() {
        let mut ds = mono8(8, 8, 1);
        ds.put(InMemElement::new(PIXEL_DATA, VR::OB, PrimitiveValue::U8(vec![1; 10].into())));
        let (source, pixels) = attach(&ds, EXPLICIT_VR_LITTLE_ENDIAN, 2);
        assert_eq!(source, IconSource::Black);
        assert_eq!(pixels, vec![0; 4]);
    }

    #[test]
    fn test_external_icon_preferred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("IMG1"), pgm(2, 2, 99)).unwrap();
        let options = IconOptions {
            enabled: true,
            prefix: Some(format!("{}/", dir.path().display())),
            ..IconOptions::default()
        };
        let mut record = DirectoryRecord::new(RecordKind::Image);
        let source = IconGenerator::new(&options)
            .attach(
                &mut record,
                &mono8(8, 8, 1),
                Path::new("IMAGES/IMG1"),
                EXPLICIT_VR_LITTLE_ENDIAN,
                2,
            )
            .unwrap();
        assert_eq!(source, IconSource::External);
        assert_eq!(icon_pixels(&record), vec![99; 4]);
    }

    #[test]
    fn test_undecodable_data_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let default_icon: PathBuf = dir.path().join("default.pgm");
        std::fs::write(&default_icon, pgm(1, 1, 128)).unwrap();
        let options = IconOptions {
            default_icon: Some(default_icon),
            ..IconOptions::default()
        };
        let mut record = DirectoryRecord::new(RecordKind::Image);
        let generator = IconGenerator::new(&options);
        let source = generator
            .attach(
                &mut record,
                &mono8(8, 8, 1),
                Path::new("IMG1"),
                "1.2.3.4.5.6",
                2,
            )
            .unwrap();
        assert_eq!(source, IconSource::Default);
        assert_eq!(icon_pixels(&record), vec![128; 4]);

        let (black, pixels) = attach(&InMemDicomObject::new_empty(), EXPLICIT_VR_LITTLE_ENDIAN, 2);
        assert_eq!(black, IconSource::Black);
        assert!(!black.is_real());
        assert_eq!(pixels, vec![0; 4]);
    }

    #[test]
    fn test_invalid_size_removes_icon() {
        let options = IconOptions::default();
        let generator = IconGenerator::new(&options);
        let mut record = DirectoryRecord::new(RecordKind::Image);
        generator
            .attach(
                &mut record,
                &mono8(4, 4, 1),
                Path::new("IMG1"),
                EXPLICIT_VR_LITTLE_ENDIAN,
                2,
            )
            .unwrap();
        let err = generator
            .attach(
                &mut record,
                &mono8(4, 4, 1),
                Path::new("IMG1"),
                EXPLICIT_VR_LITTLE_ENDIAN,
                512,
            )
            .unwrap_err();
        assert!(matches!(err, DicomdirError::Icon(_)));
        assert!(!exists(&record.attributes, ICON_IMAGE_SEQUENCE));
    }
}
