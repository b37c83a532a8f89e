//! Native GeoTIFF reading/writing on top of the `tiff` crate.
//!
//! Every band is written as its own 32-bit float image (one IFD per band).
//! Georeferencing is stored in ModelPixelScale (33550), ModelTiepoint (33922)
//! and a minimal GeoKeyDirectory (34735); no-data goes to GDAL_NODATA (42113).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::debug;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{Coverage, GeoTransform, Raster};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u32 = 1024;
const GEOGRAPHIC_TYPE_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_KEY: u32 = 3072;

/// Write a coverage to a GeoTIFF file
pub fn write_geotiff<P: AsRef<Path>>(coverage: &Coverage, path: P) -> Result<()> {
    debug!(
        path = %path.as_ref().display(),
        bands = coverage.band_count(),
        "writing GeoTIFF"
    );
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(coverage, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a GeoTIFF file into a coverage named after the file stem.
///
/// Declared statistics are not stored in the file; callers that need them
/// use [`Coverage::with_computed_statistics`].
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Coverage> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let reader = BufReader::new(File::open(path)?);
    decode_geotiff(reader, name)
}

fn encode_geotiff<W: Write + Seek>(coverage: &Coverage, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let gt = coverage.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    let geokeys = geokey_directory(coverage.crs());

    for band in coverage.bands() {
        let (rows, cols) = band.shape();
        let data: Vec<f32> = band.data().iter().map(|&v| v as f32).collect();

        let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;
        image
            .encoder()
            .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;
        image
            .encoder()
            .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;
        image
            .encoder()
            .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;
        if let Some(nodata) = band.nodata() {
            let text = nodata.to_string();
            image
                .encoder()
                .write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())?;
        }
        image.write_data(&data)?;
    }
    Ok(())
}

/// GeoKeyDirectory with model type, raster type and, when known, the EPSG code.
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(CRS::epsg).and_then(|c| u16::try_from(c).ok());
    let geographic = crs.map_or(false, CRS::is_geographic);

    let mut keys: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY as u16, 0, 1, if geographic { 2 } else { 1 }],
        [1025, 0, 1, 1], // RasterPixelIsArea
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        keys.push([key as u16, 0, 1, code]);
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.iter().flatten());
    directory
}

fn decode_geotiff<R: Read + Seek>(reader: R, name: String) -> Result<Coverage> {
    let mut decoder = Decoder::new(reader)?;
    let transform = read_geotransform(&mut decoder).unwrap_or_default();
    let crs = read_crs(&mut decoder);

    let mut bands = Vec::new();
    loop {
        bands.push(read_band(&mut decoder)?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let mut coverage = Coverage::new(name, bands)?.with_transform(transform);
    if let Some(crs) = crs {
        coverage = coverage.with_crs(crs);
    }
    Ok(coverage)
}

fn read_band<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Raster> {
    let (width, height) = decoder.dimensions()?;
    let data: Vec<f64> = match decoder.read_image()? {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut band = Raster::from_vec(data, height as usize, width as usize)?;
    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());
    band.set_nodata(nodata);
    Ok(band)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE))?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }
    Err(Error::Other("Cannot determine geotransform".into()))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let directory = decoder
        .get_tag_u32_vec(Tag::Unknown(GEO_KEY_DIRECTORY))
        .ok()?;
    let count = *directory.get(3)? as usize;
    directory
        .chunks_exact(4)
        .skip(1)
        .take(count)
        .find(|key| {
            (key[0] == GEOGRAPHIC_TYPE_KEY || key[0] == PROJECTED_CS_TYPE_KEY) && key[3] > 0
        })
        .map(|key| CRS::from_epsg(key[3]))
}
