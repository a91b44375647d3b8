//! Fixed rule tables compiled into the binary.
//!
//! `CRITICAL_DOMAINS` is the single authoritative list used both by the
//! high-priority check and by the synchronous bootstrap of the rule store.

/// Domains blocked unconditionally, ahead of the rule store.
pub const CRITICAL_DOMAINS: &[&str] = &[
    "googleads.g.doubleclick.net",
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "google-analytics.com",
    "googletagmanager.com",
    "googletagservices.com",
    "taboola.com",
    "vidstat.taboola.com",
    "outbrain.com",
    "videoexternalapi.outbrain.com",
    "widgets.outbrain.com",
    "amplify.outbrain.com",
    "facebook.com",
    "amazon-adsystem.com",
    "adsystem.amazon.com",
    "connect.facebook.net",
    "scorecardresearch.com",
    "quantserve.com",
    "revcontent.com",
    "mgid.com",
];

/// Regex sources loaded into the pattern set during bootstrap.
pub const CRITICAL_PATTERNS: &[&str] = &[
    r".*doubleclick.*",
    r".*googlesyndication.*",
    r".*googleadservices.*",
    r".*/aclk\?.*",
    r".*gclid=.*",
    r".*/ads/.*",
    r".*/ad/.*",
    r".*block-data.*",
    r".*blocked-data.*",
    r".*taboola.*",
    r".*outbrain.*",
];

/// Literal markers checked against the lowercased URL before the rule store.
pub const CRITICAL_MARKERS: &[&str] = &[
    "block-data",
    "blocked-data",
    "/aclk?",
    "/pagead/",
    "/ads/",
    "/ad/",
    "advertisement",
    "doubleclick",
    "googlesyndication",
    "gclid=",
    "utm_source=adwords",
    "utm_medium=cpc",
];

/// Broader baked-in domains, loaded after the override file.
pub const BASELINE_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googleadservices.com",
    "googlesyndication.com",
    "googletagmanager.com",
    "google-analytics.com",
    "googletagservices.com",
    "adsystem.amazon.com",
    "amazon-adsystem.com",
    "connect.facebook.net",
    "facebook.net",
    "ads.twitter.com",
    "analytics.twitter.com",
    "msads.net",
    "outbrain.com",
    "taboola.com",
    "revcontent.com",
    "mgid.com",
    "scorecardresearch.com",
    "quantserve.com",
    "chartbeat.com",
    "addthis.com",
    "sharethis.com",
    "sharethrough.com",
];

pub const BASELINE_PATTERNS: &[&str] = &[
    r".*/ads/.*",
    r".*/ad/.*",
    r".*/advertisement/.*",
    r".*/banner/.*",
    r".*/popup/.*",
    r".*/tracking/.*",
    r".*analytics.*",
    r".*doubleclick.*",
    r".*googlesyndication.*",
    r".*googleadservices.*",
    r".*/ad\?.*",
    r".*/ads\?.*",
    r".*/advert\?.*",
    r".*/track\?.*",
    r".*/pixel\?.*",
];

/// Written to the override file when it does not exist yet.
pub const OVERRIDE_TEMPLATE: &str = "\
# ad-sentry local blocklist (hosts-file syntax)
# One entry per line: \"0.0.0.0 domain.tld\" or just \"domain.tld\".
# Subdomains of every entry are blocked as well.

# Google Ads & Analytics
0.0.0.0 googleadservices.com
0.0.0.0 googlesyndication.com
0.0.0.0 doubleclick.net
0.0.0.0 google-analytics.com
0.0.0.0 googletagmanager.com
0.0.0.0 googletagservices.com

# Content recommendation networks
0.0.0.0 taboola.com
0.0.0.0 outbrain.com

# Facebook/Meta tracking
0.0.0.0 connect.facebook.net
0.0.0.0 pixel.facebook.com

# Amazon Ads
0.0.0.0 amazon-adsystem.com
0.0.0.0 adsystem.amazon.com

# Analytics & tracking
0.0.0.0 scorecardresearch.com
0.0.0.0 quantserve.com
0.0.0.0 chartbeat.com
0.0.0.0 hotjar.com
0.0.0.0 crazyegg.com
0.0.0.0 mouseflow.com

# Social widgets
0.0.0.0 addthis.com
0.0.0.0 sharethis.com
0.0.0.0 sharethrough.com

# Add your custom domains below:
";
