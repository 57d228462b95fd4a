/// The four free-text filter lists a session collects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    PatentId,
    Examiner,
    LawFirm,
    Prosecutor,
}

impl TagKind {
    pub const ALL: [TagKind; 4] = [
        TagKind::PatentId,
        TagKind::Examiner,
        TagKind::LawFirm,
        TagKind::Prosecutor,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "patent" | "patents" | "patent-id" | "patent_id" | "id" | "ids" => Some(Self::PatentId),
            "examiner" | "examiners" => Some(Self::Examiner),
            "lawfirm" | "lawfirms" | "law-firm" | "law_firm" | "firm" => Some(Self::LawFirm),
            "prosecutor" | "prosecutors" => Some(Self::Prosecutor),
            _ => None,
        }
    }

    /// Noun used in "Please add at least one ..." messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::PatentId => "Patent ID",
            Self::Examiner => "examiner",
            Self::LawFirm => "law firm",
            Self::Prosecutor => "prosecutor",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::PatentId => "Patent IDs",
            Self::Examiner => "Examiners",
            Self::LawFirm => "Law Firms",
            Self::Prosecutor => "Prosecutors",
        }
    }
}

/// Ordered, append-only list of free-text entries. Duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagList {
    entries: Vec<String>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the trimmed value. Returns false (and leaves the list alone)
    /// when nothing but whitespace was given.
    pub fn add(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.entries.push(value.to_string());
        true
    }

    /// Removes the entry currently at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.entries.len() {
            return None;
        }
        Some(self.entries.remove(index))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> DisplayFragment {
        DisplayFragment::from_labels(self.entries.iter().cloned())
    }
}

/// One removable element; `index` is the position a remove must target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagChip {
    pub index: usize,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFragment {
    pub chips: Vec<TagChip>,
}

impl DisplayFragment {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let chips = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| TagChip { index, label })
            .collect();
        Self { chips }
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TagLists {
    patent_ids: TagList,
    examiners: TagList,
    lawfirms: TagList,
    prosecutors: TagList,
}

impl TagLists {
    pub fn get(&self, kind: TagKind) -> &TagList {
        match kind {
            TagKind::PatentId => &self.patent_ids,
            TagKind::Examiner => &self.examiners,
            TagKind::LawFirm => &self.lawfirms,
            TagKind::Prosecutor => &self.prosecutors,
        }
    }

    pub fn get_mut(&mut self, kind: TagKind) -> &mut TagList {
        match kind {
            TagKind::PatentId => &mut self.patent_ids,
            TagKind::Examiner => &mut self.examiners,
            TagKind::LawFirm => &mut self.lawfirms,
            TagKind::Prosecutor => &mut self.prosecutors,
        }
    }
}
