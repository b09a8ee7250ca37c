/// File categorization by extension.
///
/// Maps file extensions (or whole paths and links) to the category folder a
/// file is sorted into. A handful of link and program patterns are checked
/// before the extension table is consulted.
///
/// # Examples
///
/// ```
/// use foldersort::file_category::{Category, classify};
///
/// assert_eq!(classify("png"), Category::Images);
/// assert_eq!(classify("https://example.com"), Category::Websites);
/// assert_eq!(classify("setup.exe"), Category::Programs);
/// assert_eq!(classify("xyz"), Category::Other);
/// ```
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Name of the bucket that whole subfolders are sorted into.
pub const FOLDER_BUCKET: &str = "folder";

/// Represents a category folder in the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Text documents and e-books (PDF, DOCX, TXT, etc.)
    Documents,
    /// Image files (JPG, PNG, SVG, etc.)
    Images,
    /// Video files (MP4, MKV, AVI, etc.)
    Videos,
    /// Audio files (MP3, FLAC, WAV, etc.)
    Audio,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code and structured data files
    Code,
    /// Web pages, links and URLs
    Websites,
    /// Executables, installers and scripts
    Programs,
    /// Font files (TTF, OTF, WOFF, etc.)
    Fonts,
    /// Spreadsheet files (XLSX, ODS, TSV, etc.)
    Spreadsheets,
    /// Presentation files (PPTX, ODP, KEY, etc.)
    Presentations,
    /// Desktop shortcuts and link files
    Shortcuts,
    /// Anything that matches no other category
    Other,
}

impl Category {
    /// Returns the folder name used for this category inside the target directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use foldersort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Websites => "Websites",
            Category::Programs => "Programs",
            Category::Fonts => "Fonts",
            Category::Spreadsheets => "Spreadsheets",
            Category::Presentations => "Presentations",
            Category::Shortcuts => "Shortcuts",
            Category::Other => "Other",
        }
    }

    /// Returns the icon shown next to files of this category in a preview.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Documents => "\u{1F4C4}",
            Category::Images => "\u{1F5BC}",
            Category::Videos => "\u{1F3AC}",
            Category::Audio => "\u{1F3B5}",
            Category::Archives => "\u{1F4E6}",
            Category::Code => "\u{1F4BB}",
            Category::Websites => "\u{1F310}",
            Category::Programs => "\u{1F5A5}",
            Category::Fonts => "\u{1F58B}",
            Category::Spreadsheets => "\u{1F4C8}",
            Category::Presentations => "\u{1F4FD}",
            Category::Shortcuts => "\u{1F517}",
            Category::Other => "\u{1F5CE}",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Extension lists in lookup order. Several extensions appear in more than
/// one list; the earlier category wins.
const TABLE_DEFINITION: &[(Category, &[&str])] = &[
    (
        Category::Documents,
        &[
            "pdf", "doc", "docx", "txt", "odt", "rtf", "xls", "xlsx", "ppt", "pptx", "csv", "md",
            "epub", "djvu",
        ],
    ),
    (
        Category::Images,
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", "webp", "heic", "ico", "raw", "psd",
        ],
    ),
    (
        Category::Videos,
        &[
            "mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "mpeg", "mpg", "3gp", "m4v", "vob",
        ],
    ),
    (
        Category::Audio,
        &[
            "mp3", "wav", "aac", "ogg", "flac", "m4a", "wma", "aiff", "alac", "opus",
        ],
    ),
    (
        Category::Archives,
        &[
            "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "iso", "cab", "arj", "lz", "lzma",
        ],
    ),
    (
        Category::Code,
        &[
            "py", "js", "ts", "java", "c", "cpp", "cs", "html", "css", "json", "xml", "yml",
            "yaml", "php", "rb", "go", "rs", "sh", "bat", "pl", "swift", "kt", "scala", "lua",
            "asm", "sql", "ini", "cfg", "toml", "ipynb",
        ],
    ),
    (
        Category::Websites,
        &[
            "html", "htm", "url", "webloc", "desktop", "asp", "aspx", "php", "jsp",
        ],
    ),
    (
        Category::Programs,
        &[
            "exe", "msi", "bat", "cmd", "sh", "bin", "app", "apk", "jar", "com", "gadget", "wsf",
            "vbs", "ps1",
        ],
    ),
    (
        Category::Fonts,
        &["ttf", "otf", "woff", "woff2", "eot", "fon", "fnt"],
    ),
    (
        Category::Spreadsheets,
        &["xls", "xlsx", "ods", "csv", "tsv"],
    ),
    (Category::Presentations, &["ppt", "pptx", "odp", "key"]),
    (
        Category::Shortcuts,
        &["lnk", "desktop", "pif", "url", "webloc"],
    ),
];

/// Extensions of files that are links to, or copies of, web pages.
const WEBSITE_EXTENSIONS: &[&str] = &[
    "html", "htm", "url", "webloc", "desktop", "asp", "aspx", "php", "jsp",
];

static WEB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?://|www\.)").expect("web URL pattern is valid")
});

static PROGRAM_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(exe|bat|cmd|msi|sh|bin|app|apk|jar|com|gadget|wsf|vbs|ps1)$")
        .expect("program suffix pattern is valid")
});

static TABLE: Lazy<CategoryTable> = Lazy::new(CategoryTable::build);

/// Ordered, immutable mapping from category to its extension set.
///
/// Built once per process; obtain it with [`CategoryTable::global`].
#[derive(Debug)]
pub struct CategoryTable {
    entries: Vec<(Category, HashSet<&'static str>)>,
}

impl CategoryTable {
    fn build() -> Self {
        let entries = TABLE_DEFINITION
            .iter()
            .map(|(category, extensions)| (*category, extensions.iter().copied().collect()))
            .collect();
        Self { entries }
    }

    /// Returns the process-wide table.
    pub fn global() -> &'static CategoryTable {
        &TABLE
    }

    /// Returns the first category, in definition order, listing `ext`.
    ///
    /// # Examples
    ///
    /// ```
    /// use foldersort::file_category::{Category, CategoryTable};
    ///
    /// let table = CategoryTable::global();
    /// assert_eq!(table.lookup("MP3"), Some(Category::Audio));
    /// // csv is listed under Documents and Spreadsheets.
    /// assert_eq!(table.lookup("csv"), Some(Category::Documents));
    /// assert_eq!(table.lookup("nope"), None);
    /// ```
    pub fn lookup(&self, ext: &str) -> Option<Category> {
        let ext = ext.to_lowercase();
        self.entries
            .iter()
            .find(|(_, extensions)| extensions.contains(ext.as_str()))
            .map(|(category, _)| *category)
    }

    /// Returns every category that lists `ext`, in definition order.
    pub fn categories_for(&self, ext: &str) -> Vec<Category> {
        let ext = ext.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, extensions)| extensions.contains(ext.as_str()))
            .map(|(category, _)| *category)
            .collect()
    }

    /// Iterates categories and their extensions in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &HashSet<&'static str>)> {
        self.entries
            .iter()
            .map(|(category, extensions)| (*category, extensions))
    }
}

/// Returns `true` if `link` starts like a web address.
pub fn is_web_url(link: &str) -> bool {
    WEB_URL.is_match(link)
}

/// Returns `true` if `ext` is the extension of a saved page or web link.
pub fn is_website_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    WEBSITE_EXTENSIONS.contains(&ext.as_str())
}

/// Returns `true` if `link` names an executable or script, or is an absolute path.
pub fn is_program_path(link: &str) -> bool {
    PROGRAM_SUFFIX.is_match(link) || Path::new(link).is_absolute()
}

/// Extracts the extension from a bare extension, a file name or a path.
///
/// A token without dots or separators is taken as the extension itself.
fn extension_of(input: &str) -> &str {
    let last_component = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let has_separator = last_component.len() != input.len();
    match last_component.rsplit_once('.') {
        Some((_, ext)) => ext,
        None if has_separator => "",
        None => last_component,
    }
}

/// Decides which category an extension, file name, path or link belongs to.
///
/// Checks are performed in this order, first match wins:
/// 1. Web address (`http://`, `https://`, `www.`) → [`Category::Websites`]
/// 2. Web page or link extension → [`Category::Websites`]
/// 3. Executable/script suffix, or an absolute path → [`Category::Programs`]
/// 4. First table category listing the extension
/// 5. [`Category::Other`]
///
/// # Examples
///
/// ```
/// use foldersort::file_category::{Category, classify};
///
/// assert_eq!(classify("www.rust-lang.org"), Category::Websites);
/// assert_eq!(classify("php"), Category::Websites);
/// assert_eq!(classify("csv"), Category::Documents);
/// assert_eq!(classify(""), Category::Other);
/// ```
pub fn classify(extension_or_path: &str) -> Category {
    let ext = extension_of(extension_or_path);

    if is_web_url(extension_or_path) || is_website_extension(ext) {
        return Category::Websites;
    }

    if is_program_path(extension_or_path) {
        return Category::Programs;
    }

    CategoryTable::global()
        .lookup(ext)
        .unwrap_or(Category::Other)
}
