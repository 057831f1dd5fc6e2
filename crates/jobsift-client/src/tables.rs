//! Per-platform CSS selector tables for rendered-DOM extraction.
//!
//! Each table lists card selectors in decreasing specificity; extraction
//! commits to the first selector that yields at least one card on the page.

use jobsift_core::Platform;

/// Selector cascades for one platform's rendered markup.
#[derive(Debug, Clone, Copy)]
pub struct DomTables {
    /// Candidates for the repeating job-card element, most specific first.
    pub card_selectors: &'static [&'static str],
    /// Candidates for the title element inside a card.
    pub title_selectors: &'static [&'static str],
    /// Candidates for the location element inside a card.
    pub location_selectors: &'static [&'static str],
}

pub const GENERIC_TABLES: DomTables = DomTables {
    card_selectors: &[
        "[data-job-id]",
        "[data-automation-id*=\"job\"]",
        "a[href*=\"/job/\"]",
        "a[href*=\"/jobs/\"]",
        "a[href*=\"/position/\"]",
        "a[href*=\"/requisition/\"]",
        "a[href*=\"/opening/\"]",
        ".job-listing a",
        ".job-card a",
        ".job-item a",
        ".job-result a",
        ".job-row a",
        ".jobs-list a",
        ".career-listing a",
        ".position-listing a",
        "article a[href*=\"job\"]",
        "li[class*=\"job\"] a",
        "div[class*=\"search-result\"] a",
        "tr[class*=\"job\"] a",
        ".job-title a",
        "a.job-link",
        "a.job-title",
        "a.position-link",
    ],
    title_selectors: &["h2", "h3", "h4", "strong", "[class*=\"title\"]", "[class*=\"name\"]"],
    location_selectors: &["[class*=\"location\"]", ".location"],
};

pub const WORKDAY_TABLES: DomTables = DomTables {
    card_selectors: &[
        "a[data-automation-id=\"jobTitle\"]",
        "[data-automation-id=\"jobTitle\"]",
        "[data-automation-id=\"compositeJobResults\"] a",
        "section[data-automation-id=\"jobResults\"] a",
        ".job-listing a[href*=\"job/\"]",
    ],
    title_selectors: &["[data-automation-id=\"jobTitle\"]", "h3", "[class*=\"title\"]"],
    location_selectors: &["[data-automation-id=\"locationText\"]", "[class*=\"location\"]"],
};

pub const GREENHOUSE_TABLES: DomTables = DomTables {
    card_selectors: &[
        "a[data-mapped=\"true\"]",
        ".opening a",
        "tr.job-post a",
        "section.level-0 a",
        "[class*=\"opening\"] a",
        "a[href*=\"/jobs/\"]",
    ],
    title_selectors: &[".opening-title", "p", "[class*=\"title\"]"],
    location_selectors: &[".location", "[class*=\"location\"]"],
};

pub const LEVER_TABLES: DomTables = DomTables {
    card_selectors: &[".posting a.posting-title", ".posting a", "a[href*=\"lever.co\"]"],
    title_selectors: &["h5", "[data-qa=\"posting-name\"]", "[class*=\"title\"]"],
    location_selectors: &[".location", ".posting-categories", "[class*=\"location\"]"],
};

pub const SMARTRECRUITERS_TABLES: DomTables = DomTables {
    card_selectors: &[".opening-job a", "a[href*=\"/job/\"]", "li.opening-job a"],
    title_selectors: &["h4", "[class*=\"title\"]"],
    location_selectors: &[".job-location", "[class*=\"location\"]"],
};

pub const EIGHTFOLD_TABLES: DomTables = DomTables {
    card_selectors: &["[data-test-id^=\"position-card-\"]", ".position-card"],
    title_selectors: &[".position-title"],
    location_selectors: &[".position-location"],
};

pub const ICIMS_TABLES: DomTables = DomTables {
    card_selectors: &[
        "a.iCIMS_JobTitle",
        ".iCIMS_JobsTable a[href*=\"/jobs/\"]",
        ".iCIMS_Anchor[href*=\"/jobs/\"]",
        "table.iCIMS_JobsTable a",
        ".iCIMS_JobListings a",
        ".job-results-list a",
        "[class*=\"job-title\"] a",
    ],
    title_selectors: &[".iCIMS_JobTitle", "h2", "[class*=\"title\"]"],
    location_selectors: &[".iCIMS_JobHeaderTag", "[class*=\"location\"]"],
};

pub const TALEO_TABLES: DomTables = DomTables {
    card_selectors: &[
        "a[id*=\"requisitionListInterface\"]",
        "a.jobTitle-link",
        "td.colTitle a",
        ".jobProperty a[href*=\"jobdetail\"]",
        "a[href*=\"job=\"]",
        "#requisitionList a",
        "table.tablelist a[href*=\"requisitionListInterface\"]",
    ],
    title_selectors: &["[class*=\"title\"]"],
    location_selectors: &["td.colLocation", ".locationColumn", "[class*=\"location\"]"],
};

pub const PLAID_TABLES: DomTables = DomTables {
    card_selectors: &[
        "a[href*=\"/careers/openings/\"]",
        "a[href*=\"/careers/\"][href*=\"/engineering/\"]",
        "a[href*=\"/careers/\"][href*=\"/data/\"]",
        "a[href*=\"/careers/\"][href*=\"/product/\"]",
        "a[href*=\"/careers/\"][href*=\"-\"]",
    ],
    title_selectors: &["h2", "h3", "h4", "strong", "[class*=\"title\"]", "[class*=\"name\"]"],
    location_selectors: &["[class*=\"location\"]"],
};

/// Controls that append results in place, tried before next-page controls.
pub const LOAD_MORE_SELECTORS: &[&str] = &[
    "[class*=\"load-more\"] button",
    "[class*=\"load-more\"]",
    "[class*=\"loadMore\"]",
    "[class*=\"show-more\"]",
    "[class*=\"showMore\"]",
    "[data-test-id=\"show-more\"]",
    "button.load-more",
];

pub const NEXT_PAGE_SELECTORS: &[&str] = &[
    "button[data-automation-id=\"paginationNextBtn\"]",
    "a.iCIMS_Paging_Next",
    "a#next",
    "a.pagerNextLink",
    "a[aria-label*=\"next\" i]",
    "button[aria-label*=\"next\" i]",
    "a[title*=\"next\" i]",
    "button[title*=\"next\" i]",
    "a[rel=\"next\"]",
    "a.next",
    "button.next",
    ".pagination a.next",
    ".pagination button.next",
    "[class*=\"next-page\"]",
    "[class*=\"nextPage\"]",
];

/// Consent/cookie overlay dismissal candidates.
pub const OVERLAY_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "[class*=\"cookie\"] button",
    "[class*=\"consent\"] button",
];

/// Path fragments that mark a link as a plausible job posting.
pub const JOB_PATH_MARKERS: &[&str] = &[
    "/job/",
    "/jobs/",
    "/position/",
    "/positions/",
    "/career/",
    "/careers/",
    "/opening/",
    "/openings/",
    "/requisition/",
    "/vacancy/",
    "/posting/",
    "/apply/",
    "job_id=",
    "jobid=",
    "requisition_id=",
];

/// Path fragments that disqualify a link outright.
pub const EXCLUDED_PATH_MARKERS: &[&str] = &[
    "/login",
    "/sign-in",
    "/signin",
    "/register",
    "/saved",
    "/alerts",
    "/profile",
    "/account",
    "/privacy",
    "/terms",
    "/cookie",
    "/accessibility",
    "mailto:",
];

/// The selector table for a classified platform. API-backed platforms get
/// their own tables too; those cover the rendered fallback path.
pub fn dom_tables_for(platform: Platform) -> DomTables {
    match platform {
        Platform::Plaid => PLAID_TABLES,
        Platform::Workday => WORKDAY_TABLES,
        Platform::Greenhouse => GREENHOUSE_TABLES,
        Platform::Lever => LEVER_TABLES,
        Platform::SmartRecruiters => SMARTRECRUITERS_TABLES,
        Platform::Eightfold => EIGHTFOLD_TABLES,
        Platform::Icims => ICIMS_TABLES,
        Platform::Taleo => TALEO_TABLES,
        Platform::Generic => GENERIC_TABLES,
    }
}
