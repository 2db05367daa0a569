//! Integration tests for imzML
//!
//! A continuous dataset is written to disk and read back through the reader,
//! then queried through the imaging document.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use imzml::imzml::{checksum, ImzML};
use imzml::mzml::{Spectrum, MS_CV_ACCESSIONS};
use imzml::reader::{read_imzml, ImzMLReader, ReaderConfig};
use proptest::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const MZ_AXIS: [f64; 4] = [100.0, 200.0, 300.0, 400.0];

/// Pixels of the 3 x 2 test image; (2, 2) was not acquired
const PIXELS: [(u32, u32); 5] = [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2)];

fn intensities(x: u32, y: u32) -> [f32; 4] {
    [x as f32, y as f32, (x * y) as f32, 1.0]
}

fn compress(values: &[f32]) -> Vec<u8> {
    let mut raw = Vec::new();
    for &value in values {
        raw.write_f32::<LittleEndian>(value).unwrap();
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    encoder.finish().unwrap()
}

struct Layout {
    axis_offset: u64,
    full_axis_offset: u64,
    intensities: Vec<(u64, u64)>,
}

/// uuid, shared m/z axis, converter axis (big-endian), zlib intensities
fn payload() -> (Vec<u8>, Layout) {
    let mut bytes = vec![0xA5u8; 16];

    let axis_offset = bytes.len() as u64;
    for &mz in &MZ_AXIS {
        bytes.write_f64::<LittleEndian>(mz).unwrap();
    }
    let full_axis_offset = bytes.len() as u64;
    for &mz in &MZ_AXIS {
        bytes.write_f64::<BigEndian>(mz).unwrap();
    }

    let mut offsets = Vec::new();
    for &(x, y) in &PIXELS {
        let compressed = compress(&intensities(x, y));
        offsets.push((bytes.len() as u64, compressed.len() as u64));
        bytes.extend_from_slice(&compressed);
    }

    let layout = Layout {
        axis_offset,
        full_axis_offset,
        intensities: offsets,
    };
    (bytes, layout)
}

fn spectrum_xml(index: usize, (x, y): (u32, u32), layout: &Layout) -> String {
    let (int_offset, int_length) = layout.intensities[index];
    let tic = if index == 0 {
        r#"<cvParam cvRef="MS" accession="MS:1000285" name="total ion current" value="99"/>"#
    } else {
        ""
    };
    format!(
        r#"
      <spectrum id="Scan={scan}" defaultArrayLength="0" index="{index}">
        <referenceableParamGroupRef ref="spectrum"/>
        {tic}
        <scanList count="1">
          <scan>
            <cvParam cvRef="IMS" accession="IMS:1000050" name="position x" value="{x}"/>
            <cvParam cvRef="IMS" accession="IMS:1000051" name="position y" value="{y}"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray encodedLength="0">
            <referenceableParamGroupRef ref="mzArray"/>
            <cvParam cvRef="IMS" accession="IMS:1000103" name="external array length" value="4"/>
            <cvParam cvRef="IMS" accession="IMS:1000102" name="external offset" value="{axis_offset}"/>
            <cvParam cvRef="IMS" accession="IMS:1000104" name="external encoded length" value="32"/>
            <binary/>
          </binaryDataArray>
          <binaryDataArray encodedLength="0">
            <referenceableParamGroupRef ref="intensityArray"/>
            <cvParam cvRef="IMS" accession="IMS:1000103" name="external array length" value="4"/>
            <cvParam cvRef="IMS" accession="IMS:1000102" name="external offset" value="{int_offset}"/>
            <cvParam cvRef="IMS" accession="IMS:1000104" name="external encoded length" value="{int_length}"/>
            <binary/>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>"#,
        scan = index + 1,
        axis_offset = layout.axis_offset,
    )
}

fn document_xml(md5: &str, layout: &Layout) -> String {
    let spectra: String = PIXELS
        .iter()
        .enumerate()
        .map(|(index, &pixel)| spectrum_xml(index, pixel, layout))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1">
  <fileDescription>
    <fileContent>
      <cvParam cvRef="MS" accession="MS:1000579" name="MS1 spectrum" value=""/>
      <cvParam cvRef="MS" accession="MS:1000127" name="centroid spectrum" value=""/>
      <cvParam cvRef="IMS" accession="IMS:1000080" name="universally unique identifier" value="{{A5A5A5A5-A5A5-A5A5-A5A5-A5A5A5A5A5A5}}"/>
      <cvParam cvRef="IMS" accession="IMS:1000090" name="ibd MD5" value="{md5}"/>
      <cvParam cvRef="IMS" accession="IMS:1000030" name="continuous" value=""/>
    </fileContent>
  </fileDescription>
  <referenceableParamGroupList count="3">
    <referenceableParamGroup id="spectrum">
      <cvParam cvRef="MS" accession="MS:1000528" name="lowest observed m/z" value="100.0"/>
      <cvParam cvRef="MS" accession="MS:1000527" name="highest observed m/z" value="400.0"/>
    </referenceableParamGroup>
    <referenceableParamGroup id="mzArray">
      <cvParam cvRef="MS" accession="MS:1000514" name="m/z array" value=""/>
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000576" name="no compression" value=""/>
    </referenceableParamGroup>
    <referenceableParamGroup id="intensityArray">
      <cvParam cvRef="MS" accession="MS:1000515" name="intensity array" value=""/>
      <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float" value=""/>
      <cvParam cvRef="MS" accession="MS:1000574" name="zlib compression" value=""/>
    </referenceableParamGroup>
  </referenceableParamGroupList>
  <softwareList count="1">
    <software id="imzMLConverter" version="2.0">
      <cvParam cvRef="IMS" accession="IMS:1000102" name="external offset" value="{full_axis_offset}"/>
      <cvParam cvRef="IMS" accession="IMS:1000104" name="external encoded length" value="32"/>
    </software>
  </softwareList>
  <scanSettingsList count="1">
    <scanSettings id="scansettings1">
      <cvParam cvRef="IMS" accession="IMS:1000042" name="max count of pixels x" value="3"/>
      <cvParam cvRef="IMS" accession="IMS:1000043" name="max count of pixels y" value="2"/>
    </scanSettings>
  </scanSettingsList>
  <run id="run1">
    <spectrumList count="{count}">{spectra}
    </spectrumList>
  </run>
</mzML>
"#,
        full_axis_offset = layout.full_axis_offset,
        count = PIXELS.len(),
    )
}

/// Write `sample.imzML` / `sample.ibd`; returns the metadata path
fn write_dataset() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let imzml_path = dir.path().join("sample.imzML");
    let ibd_path = dir.path().join("sample.ibd");

    let (bytes, layout) = payload();
    fs::write(&ibd_path, &bytes).unwrap();
    let md5 = checksum(&ibd_path, "MD5").unwrap();

    let mut file = File::create(&imzml_path).unwrap();
    file.write_all(document_xml(&md5, &layout).as_bytes()).unwrap();
    (dir, imzml_path)
}

fn read(path: &Path) -> ImzML {
    read_imzml(path).unwrap()
}

#[test]
fn test_dimensions_and_lookup() {
    let (_dir, path) = write_dataset();
    let imzml = read(&path);

    assert!(imzml.is_continuous());
    assert_eq!(imzml.spectra().len(), 5);
    assert_eq!((imzml.width().unwrap(), imzml.height().unwrap()), (3, 2));
    assert_eq!(imzml.depth().unwrap(), 1);
    assert_eq!(imzml.dimensionality().unwrap(), 3);
    assert_eq!(imzml.number_of_spectra_per_pixel().unwrap(), 1);

    assert_eq!(imzml.spectrum(3, 2).unwrap().unwrap().id, "Scan=5");
    assert!(imzml.spectrum(2, 2).unwrap().is_none());
    assert!(imzml.spectrum(4, 1).unwrap().is_none());
    assert!(imzml.spectrum(0, 1).unwrap().is_none());
}

#[test]
fn test_compressed_arrays() {
    let (_dir, path) = write_dataset();
    let imzml = read(&path);

    let spectrum = imzml.spectrum(3, 2).unwrap().unwrap();
    assert_eq!(imzml.mz_array(spectrum).unwrap().unwrap(), MZ_AXIS.to_vec());
    assert_eq!(
        imzml.intensity_array(spectrum).unwrap().unwrap(),
        vec![3.0, 2.0, 6.0, 1.0]
    );
}

#[test]
fn test_tic_image() {
    let (_dir, path) = write_dataset();
    let imzml = read(&path);

    let image = imzml.generate_tic_image().unwrap();
    assert_eq!(image, &vec![vec![99.0, 6.0, 8.0], vec![6.0, 0.0, 12.0]]);

    // computed totals are recorded on the spectra, declared ones are kept
    let first = imzml.spectrum(1, 1).unwrap().unwrap();
    let computed = imzml.spectrum(3, 2).unwrap().unwrap();
    let tic = |s: &Spectrum| {
        s.param(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT)
            .unwrap()
            .as_double()
            .unwrap()
    };
    assert_eq!(tic(first), 99.0);
    assert_eq!(tic(computed), 12.0);

    // four payload reads, none on the second call
    let reads = imzml.ibd().unwrap().read_count();
    assert_eq!(reads, 4);
    imzml.generate_tic_image().unwrap();
    assert_eq!(imzml.ibd().unwrap().read_count(), reads);
}

#[test]
fn test_mz_axes() {
    let (_dir, path) = write_dataset();
    let imzml = read(&path);

    assert_eq!(imzml.full_mz_axis().unwrap(), Some(&MZ_AXIS[..]));
    assert_eq!(imzml.minimum_detected_mz().unwrap(), Some(100.0));
    assert_eq!(imzml.maximum_detected_mz().unwrap(), Some(400.0));

    let binned = ImzML::binned_mz_axis(100.0, 400.0, 50.0);
    assert_eq!(binned, vec![100.0, 150.0, 200.0, 250.0, 300.0, 350.0]);
}

#[test]
fn test_checksum_and_validation() {
    let (dir, path) = write_dataset();
    let imzml = read(&path);

    assert_eq!(imzml.verify_ibd_checksum().unwrap(), Some(true));
    assert!(imzml.validate().is_empty(), "{:?}", imzml.validate());

    // damage the uuid prefix; arrays stay readable, the checksum does not match
    let ibd_path = dir.path().join("sample.ibd");
    let mut bytes = fs::read(&ibd_path).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&ibd_path, &bytes).unwrap();

    let imzml = read(&path);
    assert_eq!(imzml.verify_ibd_checksum().unwrap(), Some(false));
    assert!(imzml.intensity_array(&imzml.spectra()[0]).unwrap().is_some());
}

#[test]
fn test_explicit_payload_path() {
    let (dir, path) = write_dataset();
    let moved = dir.path().join("moved.ibd");
    fs::rename(dir.path().join("sample.ibd"), &moved).unwrap();

    // the derived payload is gone
    let imzml = read(&path);
    assert!(imzml.ibd().is_none());
    assert!(imzml.generate_tic_image().is_err());

    let config = ReaderConfig::new().unwrap().ibd_path(&moved);
    let imzml = ImzMLReader::open_with_config(&path, config)
        .unwrap()
        .read()
        .unwrap();
    assert_eq!(imzml.ibd_path(), Some(moved.as_path()));
    assert_eq!(imzml.generate_tic_image().unwrap()[1][2], 12.0);
}

#[test]
fn test_concurrent_queries() {
    let (_dir, path) = write_dataset();
    let imzml = read(&path);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                assert_eq!(imzml.generate_tic_image().unwrap()[0][0], 99.0);
                assert_eq!(imzml.spectrum(1, 2).unwrap().unwrap().id, "Scan=4");
            });
        }
    });
    assert_eq!(imzml.ibd().unwrap().read_count(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_binned_axis_covers_range(
        min in 0.0f64..5000.0,
        span in 0.0f64..1000.0,
        bin in 0.1f64..10.0,
    ) {
        let max = min + span;
        let axis = ImzML::binned_mz_axis(min, max, bin);
        let tolerance = 1e-6;

        if let (Some(first), Some(last)) = (axis.first(), axis.last()) {
            prop_assert!(*first <= min + tolerance);
            prop_assert!(*first > min - bin - tolerance);
            prop_assert!(last + bin >= max - tolerance);
        } else {
            // only a range collapsing onto one bin edge is empty
            prop_assert!(max - min < 1e-5);
            prop_assert!(((min / bin).round() - min / bin).abs() < 1e-4);
        }
        for pair in axis.windows(2) {
            prop_assert!((pair[1] - pair[0] - bin).abs() < tolerance);
        }
    }

    #[test]
    fn prop_invalid_bins_give_empty_axis(
        min in 0.0f64..5000.0,
        bin in -10.0f64..=0.0,
    ) {
        prop_assert!(ImzML::binned_mz_axis(min, min + 10.0, bin).is_empty());
        prop_assert!(ImzML::binned_mz_axis(min + 10.0, min, 1.0).is_empty());
    }
}
