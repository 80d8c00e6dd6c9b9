//! Place PNG rasters on PDF pages
//!
//! Used for dashboard snapshots and for raster copies of a rendered
//! contract. Transparency is flattened onto white.

use std::io::{Cursor, Write};

use contract_generator::render::PageSize;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{ExportError, Result};

/// 10 mm in points
const TOP_MARGIN_PT: f64 = 28.346;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale to fit inside the page, centered horizontally, 10 mm from the top
    #[default]
    FitPage,
    /// Scale to page width; tall images continue on following pages
    FitWidth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComposeOptions {
    pub page_size: PageSize,
    pub landscape: bool,
    pub mode: FitMode,
}

impl ComposeOptions {
    /// Page width and height in points, orientation applied
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (w, h) = self.page_size.dimensions_pt();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }
}

/// Decoded 8-bit RGB raster
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode a PNG of any color type to RGB, blending alpha over white
pub fn decode_png(bytes: &[u8]) -> Result<RgbImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| ExportError::Image(e.to_string()))?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buffer)
        .map_err(|e| ExportError::Image(e.to_string()))?;
    let data = &buffer[..info.buffer_size()];

    if info.width == 0 || info.height == 0 {
        return Err(ExportError::Image("image has no pixels".into()));
    }

    let pixels = match info.color_type {
        png::ColorType::Rgb => data.to_vec(),
        png::ColorType::Rgba => data
            .chunks_exact(4)
            .flat_map(|px| {
                let a = px[3];
                [over_white(px[0], a), over_white(px[1], a), over_white(px[2], a)]
            })
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g]).collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|px| {
                let g = over_white(px[0], px[1]);
                [g, g, g]
            })
            .collect(),
        png::ColorType::Indexed => {
            return Err(ExportError::Image("palette image was not expanded".into()));
        }
    };

    Ok(RgbImage {
        width: info.width,
        height: info.height,
        pixels,
    })
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// One PNG on one or more pages
pub fn compose_pdf_from_png(png_bytes: &[u8], options: &ComposeOptions) -> Result<Vec<u8>> {
    compose_pdf_from_pngs(&[png_bytes], options)
}

/// Several PNGs, each starting on a new page
pub fn compose_pdf_from_pngs<B: AsRef<[u8]>>(
    images: &[B],
    options: &ComposeOptions,
) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(ExportError::Compose("no images to place".into()));
    }

    let (page_w, page_h) = options.page_dimensions();
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for (index, bytes) in images.iter().enumerate() {
        let image = decode_png(bytes.as_ref())?;
        let image_id = doc.add_object(image_xobject(&image)?);
        let name = format!("Im{}", index);

        for placement in placements(&image, options) {
            let page_id = add_page(&mut doc, pages_id, image_id, &name, page_w, page_h, placement)?;
            kids.push(Object::Reference(page_id));
        }
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ExportError::Compose(e.to_string()))?;
    tracing::debug!(pages = count, bytes = output.len(), "Composed PDF from raster");
    Ok(output)
}

/// Where the image lands on one page, in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x: f64,
    /// Bottom edge of the image
    y: f64,
    width: f64,
    height: f64,
}

fn placements(image: &RgbImage, options: &ComposeOptions) -> Vec<Placement> {
    let (page_w, page_h) = options.page_dimensions();
    let (img_w, img_h) = (image.width as f64, image.height as f64);

    match options.mode {
        FitMode::FitPage => {
            let ratio = (page_w / img_w).min(page_h / img_h);
            let (width, height) = (img_w * ratio, img_h * ratio);
            vec![Placement {
                x: (page_w - width) / 2.0,
                y: page_h - TOP_MARGIN_PT - height,
                width,
                height,
            }]
        }
        FitMode::FitWidth => {
            let height = img_h * page_w / img_w;
            // Pixel rounding can leave a sliver past the last page
            let pages = ((height / page_h) - 0.005).ceil().max(1.0) as usize;
            (0..pages)
                .map(|page| Placement {
                    x: 0.0,
                    y: page_h * (page as f64 + 1.0) - height,
                    width: page_w,
                    height,
                })
                .collect()
        }
    }
}

fn image_xobject(image: &RgbImage) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&image.pixels)?;
    let compressed = encoder.finish()?;

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    );
    stream.allows_compression = false;
    Ok(stream)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image_id: ObjectId,
    name: &str,
    page_w: f64,
    page_h: f64,
    placement: Placement,
) -> Result<ObjectId> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width as f32),
                    0.into(),
                    0.into(),
                    Object::Real(placement.height as f32),
                    Object::Real(placement.x as f32),
                    Object::Real(placement.y as f32),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ExportError::Compose(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(page_w as f32),
            Object::Real(page_h as f32),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                name => Object::Reference(image_id),
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn png(width: u32, height: u32, color: png::ColorType, pixel: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = pixel
                .iter()
                .copied()
                .cycle()
                .take(pixel.len() * (width * height) as usize)
                .collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    #[test]
    fn test_alpha_flattened_onto_white() {
        let bytes = png(2, 1, png::ColorType::Rgba, &[0, 0, 0, 0]);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.pixels, vec![255; 6]);

        let bytes = png(1, 1, png::ColorType::Rgba, &[0, 0, 0, 255]);
        assert_eq!(decode_png(&bytes).unwrap().pixels, vec![0, 0, 0]);
    }

    #[test]
    fn test_grayscale_expanded() {
        let bytes = png(1, 1, png::ColorType::Grayscale, &[128]);
        assert_eq!(decode_png(&bytes).unwrap().pixels, vec![128, 128, 128]);
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        assert!(matches!(decode_png(b"not a png"), Err(ExportError::Image(_))));
    }

    #[test]
    fn test_fit_page_centers_and_keeps_aspect() {
        let image = RgbImage {
            width: 100,
            height: 100,
            pixels: vec![],
        };
        let options = ComposeOptions::default();
        let placements = placements(&image, &options);

        assert_eq!(placements.len(), 1);
        let p = placements[0];
        assert!((p.width - 595.28).abs() < 1e-6);
        assert!((p.width - p.height).abs() < 1e-6);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - (841.89 - TOP_MARGIN_PT - 595.28)).abs() < 1e-6);
    }

    #[test]
    fn test_fit_width_spills_over_pages() {
        // Three and a half A4 pages tall at page width
        let image = RgbImage {
            width: 100,
            height: (100.0 * 841.89 / 595.28 * 3.5) as u32,
            pixels: vec![],
        };
        let options = ComposeOptions {
            mode: FitMode::FitWidth,
            ..ComposeOptions::default()
        };
        let placements = placements(&image, &options);

        assert_eq!(placements.len(), 4);
        // Each page shifts the image up by one page height
        let delta = placements[1].y - placements[0].y;
        assert!((delta - 841.89).abs() < 1e-6);
    }

    #[test]
    fn test_composed_pdf_reloads() {
        let bytes = png(4, 2, png::ColorType::Rgb, &[10, 20, 30]);
        let pdf = compose_pdf_from_png(
            &bytes,
            &ComposeOptions {
                page_size: PageSize::Letter,
                landscape: true,
                mode: FitMode::FitPage,
            },
        )
        .unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_multiple_images_one_page_each() {
        let a = png(1, 1, png::ColorType::Rgb, &[0, 0, 0]);
        let b = png(1, 1, png::ColorType::Rgb, &[255, 255, 255]);
        let pdf = compose_pdf_from_pngs(&[a, b], &ComposeOptions::default()).unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_no_images_rejected() {
        let empty: [&[u8]; 0] = [];
        assert!(matches!(
            compose_pdf_from_pngs(&empty, &ComposeOptions::default()),
            Err(ExportError::Compose(_))
        ));
    }
}
