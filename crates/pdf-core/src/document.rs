//! PDF Document wrapper

use crate::font::{encode_win_ansi, StandardFont};
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{calculate_x_offset, encode_literal, generate_text_operators, TextRenderContext};
use crate::{Align, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Prefix for font resource names, chosen to avoid clashing with template resources
const FONT_RESOURCE_PREFIX: &str = "FmF";

/// Prefix for image resource names
const IMAGE_RESOURCE_PREFIX: &str = "FmIm";

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 rounded to whole points
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

/// A single drawing operation recorded on a page
///
/// Coordinates are PDF native: points from the bottom-left corner. Text `x`
/// is the final left edge after alignment; image `y` is the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        font: StandardFont,
        font_size: f32,
        color: Color,
        x: f64,
        y: f64,
    },
    Image {
        resource: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// An image XObject already added to the document
#[derive(Debug, Clone)]
struct EmbeddedImage {
    object_id: ObjectId,
    resource_name: String,
    width: u32,
    height: u32,
}

/// PDF Document wrapper providing high-level operations
///
/// Drawing calls only record [`DrawOp`]s; content streams and resource
/// dictionaries are produced when the document is serialized, so a document
/// can be inspected and serialized more than once.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Current font face
    current_font: StandardFont,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Embedded images (data hash -> image)
    embedded_images: HashMap<u64, EmbeddedImage>,
    /// Next image resource number
    next_image_resource: u32,
    /// Recorded operations per page (page number -> operations)
    page_ops: BTreeMap<usize, Vec<DrawOp>>,
}

impl PdfDocument {
    fn from_inner(inner: Document) -> Self {
        Self {
            inner,
            current_font: StandardFont::default(),
            current_font_size: 10.0,
            current_text_color: Color::default(),
            embedded_images: HashMap::new(),
            next_image_resource: 1,
            page_ops: BTreeMap::new(),
        }
    }

    /// Open a PDF document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::checked(inner)
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::checked(inner)
    }

    fn checked(inner: Document) -> Result<Self> {
        if inner.get_pages().is_empty() {
            return Err(PdfError::OpenError("Document has no pages".to_string()));
        }
        Ok(Self::from_inner(inner))
    }

    /// Create a document with a single empty page
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::blank(PageSize::A4);
    /// assert_eq!(doc.page_count(), 1);
    /// ```
    pub fn blank(size: PageSize) -> Self {
        let mut inner = Document::with_version("1.7");
        let pages_id = inner.new_object_id();

        let contents_id = inner.add_object(Stream::new(Dictionary::new(), vec![]));
        let page_id = inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", media_box(size)),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(contents_id)),
        ]));

        inner.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );

        let catalog_id = inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        inner.trailer.set("Root", Object::Reference(catalog_id));

        Self::from_inner(inner)
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Set the current font face and size
    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.current_font = font;
        self.current_font_size = size;
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Width of `text` in points with the current font and size
    pub fn text_width(&self, text: &str) -> f64 {
        self.current_font
            .text_width_points(text, self.current_font_size)
    }

    fn check_page(&self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        Ok(())
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from bottom)
    /// * `align` - Alignment of the text relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        self.check_page(page)?;

        if text.is_empty() {
            return Ok(());
        }

        let width = self.text_width(text);
        // Alignment is anchored at x, so shift by the offset within a zero-width box
        let start_x = x + calculate_x_offset(width, 0.0, align);

        self.page_ops.entry(page).or_default().push(DrawOp::Text {
            text: text.to_string(),
            font: self.current_font,
            font_size: self.current_font_size,
            color: self.current_text_color,
            x: start_x,
            y,
        });

        Ok(())
    }

    /// Insert an image at a specific position
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the bottom edge in points
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.insert_image_scaled(data, page, x, y, width, height, ImageScaleMode::Stretch)
    }

    /// Insert an image with scaling mode
    ///
    /// Scaled images keep their bottom-left corner at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image_scaled(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<()> {
        self.check_page(page)?;

        let image = self.get_or_embed_image(data)?;
        let (actual_width, actual_height) =
            calculate_scaled_dimensions(image.width, image.height, width, height, mode);

        self.page_ops.entry(page).or_default().push(DrawOp::Image {
            resource: image.resource_name,
            x,
            y,
            width: actual_width,
            height: actual_height,
        });

        Ok(())
    }

    /// Embed image bytes once, keyed by content hash
    fn get_or_embed_image(&mut self, data: &[u8]) -> Result<EmbeddedImage> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(image) = self.embedded_images.get(&data_hash) {
            return Ok(image.clone());
        }

        let xobject = ImageXObject::from_bytes(data)?;
        if xobject.width == 0 || xobject.height == 0 {
            return Err(PdfError::ImageError("Image has zero dimensions".to_string()));
        }

        let object_id = xobject.embed(&mut self.inner);
        let image = EmbeddedImage {
            object_id,
            resource_name: format!("{IMAGE_RESOURCE_PREFIX}{}", self.next_image_resource),
            width: xobject.width,
            height: xobject.height,
        };
        self.next_image_resource += 1;
        self.embedded_images.insert(data_hash, image.clone());

        Ok(image)
    }

    /// Recorded drawing operations for a page (1-indexed)
    pub fn page_ops(&self, page: usize) -> &[DrawOp] {
        self.page_ops.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Page size from the page's (possibly inherited) MediaBox
    pub fn page_size(&self, page: usize) -> Result<PageSize> {
        let page_id = self.page_id(page)?;
        let media_box = self.get_inherited_media_box(page_id)?;
        extract_size_from_media_box(&media_box)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Add a blank page sized like the first page
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self) -> Result<usize> {
        let size = self.page_size(1).unwrap_or(PageSize::A4);
        self.add_page_with_size(size)
    }

    /// Add a blank page with explicit dimensions
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page_with_size(&mut self, size: PageSize) -> Result<usize> {
        let page_count = self.page_count();
        let pages_id = self.root_pages_id()?;

        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), vec![]));
        let new_page_id = self.inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", media_box(size)),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(contents_id)),
        ]));

        let pages_dict = self
            .inner
            .get_object(pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

        let mut kids_array = pages_dict
            .get(b"Kids")
            .and_then(Object::as_array)
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))?
            .clone();
        kids_array.push(Object::Reference(new_page_id));

        let current_count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Pages object missing Count".to_string()))?;

        let mut new_pages_dict = pages_dict.clone();
        new_pages_dict.set("Kids", Object::Array(kids_array));
        new_pages_dict.set("Count", Object::Integer(current_count + 1));
        self.inner.objects.insert(pages_id, new_pages_dict.into());

        Ok(page_count + 1)
    }

    /// Object ID of the root Pages node
    fn root_pages_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
        self.inner
            .get_object(catalog_id)?
            .as_dict()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }

    /// Get MediaBox, following parent inheritance chain if needed
    fn get_inherited_media_box(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                let media_box_array = match media_box {
                    Object::Array(arr) => arr.clone(),
                    Object::Reference(ref_id) => self
                        .inner
                        .get_object(*ref_id)?
                        .as_array()
                        .map_err(|_| {
                            PdfError::ParseError("MediaBox reference is not an array".to_string())
                        })?
                        .clone(),
                    _ => return Err(PdfError::ParseError("MediaBox is not an array".to_string())),
                };
                return Ok(media_box_array);
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(match media_box(PageSize::A4) {
            Object::Array(arr) => arr,
            _ => Vec::new(),
        })
    }

    /// Resolve a page's (possibly inherited or referenced) Resources dictionary
    fn page_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current_id = page_id;

        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            match dict.get(b"Resources") {
                Ok(Object::Dictionary(resources)) => return Ok(resources.clone()),
                Ok(Object::Reference(ref_id)) => {
                    return Ok(self
                        .inner
                        .get_object(*ref_id)?
                        .as_dict()
                        .cloned()
                        .unwrap_or_default())
                }
                _ => {}
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(Dictionary::new())
    }

    /// References to a page's existing content streams, in drawing order
    ///
    /// Streams are kept as they are, filters included. Inline streams are
    /// moved into their own objects.
    fn existing_contents(out: &mut Document, page_id: ObjectId) -> Result<Vec<Object>> {
        let contents = match out
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .get(b"Contents")
        {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(id)) => match out.get_object(*id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(other) => vec![other.clone()],
            Err(_) => Vec::new(),
        };

        Ok(contents
            .into_iter()
            .filter_map(|obj| match obj {
                Object::Reference(_) => Some(obj),
                Object::Stream(stream) => Some(Object::Reference(out.add_object(stream))),
                _ => None,
            })
            .collect())
    }

    /// Content stream bytes and used resources for one page's operations
    fn encode_page_ops(
        &self,
        ops: &[DrawOp],
        fonts: &BTreeMap<StandardFont, String>,
    ) -> (Vec<u8>, BTreeSet<StandardFont>, BTreeSet<String>) {
        let mut content = Vec::new();
        let mut used_fonts = BTreeSet::new();
        let mut used_images = BTreeSet::new();

        for op in ops {
            match op {
                DrawOp::Text {
                    text,
                    font,
                    font_size,
                    color,
                    x,
                    y,
                } => {
                    let ctx = TextRenderContext {
                        font_name: fonts[font].clone(),
                        font_size: *font_size,
                        text_width: font.text_width_points(text, *font_size),
                        color: *color,
                    };
                    let operand = encode_literal(&encode_win_ansi(text));
                    content.extend(generate_text_operators(&operand, *x, *y, Align::Left, &ctx));
                    used_fonts.insert(*font);
                }
                DrawOp::Image {
                    resource,
                    x,
                    y,
                    width,
                    height,
                } => {
                    content.extend(generate_image_operators(resource, *x, *y, *width, *height));
                    used_images.insert(resource.clone());
                }
            }
        }

        (content, used_fonts, used_images)
    }

    /// Produce a finished lopdf document with all recorded operations applied
    fn render(&self) -> Result<Document> {
        let mut out = self.inner.clone();

        let used_fonts: BTreeSet<StandardFont> = self
            .page_ops
            .values()
            .flatten()
            .filter_map(|op| match op {
                DrawOp::Text { font, .. } => Some(*font),
                DrawOp::Image { .. } => None,
            })
            .collect();

        let mut font_names = BTreeMap::new();
        let mut font_ids = BTreeMap::new();
        for (index, font) in used_fonts.into_iter().enumerate() {
            font_names.insert(font, format!("{FONT_RESOURCE_PREFIX}{}", index + 1));
            font_ids.insert(font, out.add_object(font.to_pdf_dictionary()));
        }

        let image_ids: HashMap<&str, ObjectId> = self
            .embedded_images
            .values()
            .map(|image| (image.resource_name.as_str(), image.object_id))
            .collect();

        for (&page, ops) in &self.page_ops {
            if ops.is_empty() {
                continue;
            }
            let page_id = self.page_id(page)?;
            let (ops_content, page_fonts, page_images) = self.encode_page_ops(ops, &font_names);

            let mut resources = self.page_resources(page_id)?;

            let mut font_dict = sub_dictionary(&out, &resources, b"Font");
            for font in &page_fonts {
                font_dict.set(font_names[font].as_bytes(), Object::Reference(font_ids[font]));
            }
            if !page_fonts.is_empty() {
                resources.set("Font", Object::Dictionary(font_dict));
            }

            let mut xobject_dict = sub_dictionary(&out, &resources, b"XObject");
            for name in &page_images {
                let object_id = image_ids.get(name.as_str()).copied().ok_or_else(|| {
                    PdfError::SaveError(format!("Image resource {name} was never embedded"))
                })?;
                xobject_dict.set(name.as_bytes(), Object::Reference(object_id));
            }
            if !page_images.is_empty() {
                resources.set("XObject", Object::Dictionary(xobject_dict));
            }

            // Isolate the template's graphics state from the overlay
            let mut contents = Self::existing_contents(&mut out, page_id)?;
            let overlay = if contents.is_empty() {
                ops_content
            } else {
                let save = out.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
                contents.insert(0, Object::Reference(save));
                let mut overlay = b"\nQ\n".to_vec();
                overlay.extend(ops_content);
                overlay
            };
            contents.push(Object::Reference(
                out.add_object(Stream::new(Dictionary::new(), overlay)),
            ));

            let mut page_dict = out
                .get_object(page_id)?
                .as_dict()
                .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?
                .clone();
            page_dict.set("Contents", Object::Array(contents));
            page_dict.set("Resources", Object::Dictionary(resources));
            out.objects.insert(page_id, page_dict.into());
        }

        Ok(out)
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = self.render()?;
        out.save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Serialize the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.render()?;
        let mut buffer = Vec::new();
        out.save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

/// MediaBox array for a page size
fn media_box(size: PageSize) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(size.width as _),
        Object::Real(size.height as _),
    ])
}

/// Numeric value of an Integer or Real object
fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Extract the page size from a MediaBox array
fn extract_size_from_media_box(media_box: &[Object]) -> Result<PageSize> {
    if media_box.len() < 4 {
        return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
    }

    let coords: Vec<f64> = media_box[..4]
        .iter()
        .map(|obj| {
            number(obj).ok_or_else(|| PdfError::ParseError("Invalid MediaBox value".to_string()))
        })
        .collect::<Result<_>>()?;

    Ok(PageSize {
        width: coords[2] - coords[0],
        height: coords[3] - coords[1],
    })
}

/// Clone a sub-dictionary (e.g. /Font) of a resources dictionary, resolving references
fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}
