//! Tests for YAML loader module

use super::*;
use crate::browser::RenderedPage;
use crate::error::Error;
use crate::extract::{FieldValue, Record};
use crate::pagination::{AdvanceOutcome, Advancer};
use crate::types::RecordKind;
use pretty_assertions::assert_eq;

const MINIMAL: &str = r#"
name: test-market
base_url: https://market.test
listings:
  - name: services
    kind: listing
    locator: "{{ base_url }}/category/{{ category_id }}"
    variable: category_id
    extract:
      container: article
      fields:
        title:
          selector: h3
        seller:
          selector: .seller
        link:
          selector: a
          attr: href
"#;

fn config_message(err: Error) -> String {
    match err {
        Error::Config { message } => message,
        other => panic!("expected config error, got {other:?}"),
    }
}

// ============================================================================
// Basic Loading Tests
// ============================================================================

#[test]
fn test_load_minimal_site() {
    let def = load_site_from_str(MINIMAL).unwrap();
    assert_eq!(def.name, "test-market");
    assert_eq!(def.version, "0.1.0");
    assert_eq!(def.listing_names(), vec!["services"]);

    let listing = def.listing("services").unwrap();
    assert_eq!(listing.kind, RecordKind::Listing);
    assert_eq!(listing.variable.as_deref(), Some("category_id"));
    assert!(listing.pagination.is_none());
    assert!(listing.fallback.is_none());
    assert!(!listing.dedup);
    assert!(def.profile.is_none());
}

#[test]
fn test_browser_defaults() {
    let def = load_site_from_str(MINIMAL).unwrap();
    assert_eq!(def.browser.timeout_secs, 10);
    assert_eq!(def.browser.min_interval_ms, 500);
    assert_eq!(def.browser.jitter_ms, 1000);

    let config = def.browser_config();
    assert_eq!(config.base_url.as_deref(), Some("https://market.test"));
    assert_eq!(config.timeout, std::time::Duration::from_secs(10));
    assert!(config.rate_limit.is_some());
}

#[test]
fn test_browser_overrides_and_headers() {
    let yaml = MINIMAL.replace(
        "listings:",
        "browser:\n  timeout_secs: 3\n  user_agent: test-agent\nheaders:\n  Accept-Language: ko-KR\nlistings:",
    );
    let def = load_site_from_str(&yaml).unwrap();
    let config = def.browser_config();

    assert_eq!(config.timeout, std::time::Duration::from_secs(3));
    assert_eq!(config.user_agent, "test-agent");
    assert_eq!(
        config.default_headers.get("Accept-Language").map(String::as_str),
        Some("ko-KR")
    );
}

#[test]
fn test_load_site_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market.yaml");
    std::fs::write(&path, MINIMAL).unwrap();

    let def = load_site(&path).unwrap();
    assert_eq!(def.name, "test-market");
}

#[test]
fn test_load_unknown_site_lists_builtins() {
    let message = config_message(load_site("nowhere").unwrap_err());
    assert!(message.contains("kmong"));
}

// ============================================================================
// Built-in Site Tests
// ============================================================================

#[test]
fn test_builtin_kmong_loads() {
    let def = load_site("kmong").unwrap();
    assert_eq!(def.base_url, "https://kmong.com");
    assert_eq!(def.listing_names(), vec!["services", "reviews", "portfolios"]);

    let services = def.listing("services").unwrap();
    assert_eq!(services.targets, vec!["661", "663", "645", "605"]);
    assert!(services.dedup);

    let profile = def.profile.as_ref().unwrap();
    assert_eq!(profile.variable, "seller");
    assert_eq!(profile.listing_refs(), vec!["reviews", "portfolios"]);
    assert_eq!(
        profile.fields.names(),
        vec!["career", "introduction", "skills", "specialties", "total_jobs"]
    );
}

#[test]
fn test_category_listings_exclude_profile_listings() {
    let def = load_site("kmong").unwrap();
    let names: Vec<&str> = def
        .category_listings()
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, vec!["services"]);
}

#[test]
fn test_kmong_service_cards() {
    let def = load_site("kmong").unwrap();
    let extractor = build_extractor(def.listing("services").unwrap()).unwrap();

    let page = RenderedPage::new(
        "https://kmong.com/category/661",
        r#"<article class="css-1 edqw2x10">
             <a href="/gig/123">
               <span class="text-[14px] font-bold leading-[21px] text-gray-900 mb-1 line-clamp-2">로고 제작</span>
               <span class="line-clamp-1 text-xs font-normal leading-[18px] text-gray-600">디자인공방</span>
             </a>
           </article>"#,
    );

    assert_eq!(
        extractor.extract(&page).unwrap(),
        vec![Record::Listing {
            title: "로고 제작".to_string(),
            seller: "디자인공방".to_string(),
            link: "https://kmong.com/gig/123".to_string(),
        }]
    );
}

#[test]
fn test_kmong_service_cards_fallback() {
    let def = load_site("kmong").unwrap();
    let extractor = build_extractor(def.listing("services").unwrap()).unwrap();

    // Markup without the usual classes: only the text layout is left
    let page = RenderedPage::new(
        "https://kmong.com/category/661",
        r#"<article><a href="/gig/9"><p>웹사이트 제작</p><p>코딩하우스</p></a></article>"#,
    );

    assert_eq!(
        extractor.extract(&page).unwrap(),
        vec![Record::Listing {
            title: "웹사이트 제작".to_string(),
            seller: "코딩하우스".to_string(),
            link: "https://kmong.com/gig/9".to_string(),
        }]
    );
}

#[test]
fn test_kmong_review_cards() {
    let def = load_site("kmong").unwrap();
    let extractor = build_extractor(def.listing("reviews").unwrap()).unwrap();

    let page = RenderedPage::new(
        "https://kmong.com/@seller",
        r#"<div class="RatingList">
             <span class="RatingList__rating-user-info">24.03.15 작성</span>
             <div class="RatingList__buyer-selling-service-gig-info">
               <div><span>로고 디자인</span><span>| 3일</span></div>
               <div>주문 금액 범위 : 5만원 ~ 10만원</div>
             </div>
           </div>"#,
    );

    assert_eq!(
        extractor.extract(&page).unwrap(),
        vec![Record::Review {
            date: "24.03.15".to_string(),
            service_title: "로고 디자인".to_string(),
            period: Some("3일".to_string()),
            price: Some("5만원 ~ 10만원".to_string()),
        }]
    );
}

#[test]
fn test_kmong_portfolio_cards() {
    let def = load_site("kmong").unwrap();
    let extractor = build_extractor(def.listing("portfolios").unwrap()).unwrap();

    let page = RenderedPage::new(
        "https://kmong.com/@seller/portfolios",
        r#"<article><a href="/portfolio/7"><p>카페 포스터</p><p>#포스터 #인쇄</p></a></article>"#,
    );

    assert_eq!(
        extractor.extract(&page).unwrap(),
        vec![Record::Service {
            title: "카페 포스터".to_string(),
            hashtag: Some("#포스터 #인쇄".to_string()),
            link: "https://kmong.com/portfolio/7".to_string(),
        }]
    );
}

#[test]
fn test_kmong_profile_fields() {
    let def = load_site("kmong").unwrap();
    let extractor = build_profile_extractor(def.profile.as_ref().unwrap()).unwrap();

    let page = RenderedPage::new(
        "https://kmong.com/@seller",
        r#"<div class="ProfileDescriptionSection__desctiption"> 10년차 디자이너입니다. </div>
           <div class="ProfileInformationSection__section">
             <span class="ProfileInformationSection__section-infomation-description">98%</span>
             <span class="ProfileInformationSection__section-infomation-description">152개</span>
           </div>
           <div class="DescriptionDetailSection">
             <div><div class="ProfileSectionTitle">경력사항</div>
               <div class="ProfileSkillSection__tag">A사 디자인팀</div></div>
             <div class="ProfileSkillSection__specialty">
               <div><div class="ProfileSkillSection__title">디자인</div>
                 <div class="ProfileSkillSection__tag">로고</div>
                 <div class="ProfileSkillSection__tag">명함</div></div>
             </div>
           </div>"#,
    );

    let fields = extractor.extract(&page);
    assert_eq!(
        fields["introduction"],
        FieldValue::Text("10년차 디자이너입니다.".to_string())
    );
    assert_eq!(fields["total_jobs"], FieldValue::Text("152".to_string()));
    assert_eq!(
        fields["career"],
        FieldValue::List(vec!["A사 디자인팀".to_string()])
    );
    assert_eq!(fields["skills"], FieldValue::List(Vec::new()));
    match &fields["specialties"] {
        FieldValue::Map(groups) => {
            assert_eq!(groups["디자인"], vec!["로고".to_string(), "명함".to_string()]);
        }
        other => panic!("expected map, got {other:?}"),
    }
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn test_build_advancer_without_pagination() {
    let def = load_site_from_str(MINIMAL).unwrap();
    // Single page: the advancer never reaches the browser
    let advancer = build_advancer(def.listing("services").unwrap().pagination.as_ref());
    let mut browser = crate::browser::scripted::ScriptedBrowser::numbered(3);
    let outcome = tokio_test::block_on(advancer.advance(&mut browser));
    assert_eq!(outcome, AdvanceOutcome::NoControlFound);
    assert_eq!(browser.triggers, 0);
}

#[tokio::test]
async fn test_kmong_category_pager_read_from_buttons() {
    use crate::browser::scripted::ScriptedBrowser;
    use crate::browser::Browser;

    let def = load_site("kmong").unwrap();
    let pagination = def.listing("services").unwrap().pagination.as_ref();
    assert_eq!(
        pagination.and_then(|p| p.page_param.as_deref()),
        Some("page")
    );
    let advancer = build_advancer(pagination);

    let pager = |next: &str| {
        format!("<div class='e1t3wbc50'><button>1</button><button>2</button>{next}</div>")
    };

    let mut last = ScriptedBrowser::new(vec![pager("<button disabled>&gt;</button>")]);
    last.navigate("https://kmong.com/category/661").await.unwrap();
    assert_eq!(advancer.advance(&mut last).await, AdvanceOutcome::Disabled);
    assert_eq!(last.triggers, 0);

    // An enabled button without a link still leads to a page load
    let mut more = ScriptedBrowser::new(vec![pager("<button>&gt;</button>")]);
    more.navigate("https://kmong.com/category/661").await.unwrap();
    advancer.advance(&mut more).await;
    assert_eq!(more.navigations, 2);
    assert_eq!(more.triggers, 0);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_empty_page_param_rejected() {
    let yaml = format!("{MINIMAL}    pagination:\n      control: nav button\n      page_param: \"\"\n");
    assert!(matches!(
        load_site_from_str(&yaml).unwrap_err(),
        Error::InvalidConfigValue { .. }
    ));
}

#[test]
fn test_empty_name_rejected() {
    let yaml = MINIMAL.replace("name: test-market", "name: \"\"");
    assert!(load_site_from_str(&yaml).is_err());
}

#[test]
fn test_invalid_base_url_rejected() {
    let yaml = MINIMAL.replace("https://market.test", "not a url");
    assert!(matches!(
        load_site_from_str(&yaml).unwrap_err(),
        Error::InvalidConfigValue { .. }
    ));
}

#[test]
fn test_duplicate_listing_names_rejected() {
    let listing = MINIMAL.split_once("listings:\n").unwrap().1;
    let yaml = format!("{MINIMAL}{listing}");
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("Duplicate listing names"));
}

#[test]
fn test_no_listings_rejected() {
    let yaml = "name: x\nbase_url: https://market.test\nlistings: []\n";
    assert!(load_site_from_str(yaml).is_err());
}

#[test]
fn test_bad_selector_rejected() {
    let yaml = MINIMAL.replace("container: article", "container: \"article[\"");
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("services"));
}

#[test]
fn test_bad_pattern_rejected() {
    let yaml = format!(
        "{MINIMAL}    fallback:\n      pattern: \"(?P<title>unclosed\"\n"
    );
    assert!(load_site_from_str(&yaml).is_err());
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = MINIMAL.replace("        seller:", "        price:");
    assert!(load_site_from_str(&yaml).is_err());
}

#[test]
fn test_bad_pagination_control_rejected() {
    let yaml = format!("{MINIMAL}    pagination:\n      control: \"li[\"\n");
    assert!(load_site_from_str(&yaml).is_err());
}

#[test]
fn test_unknown_locator_variable_rejected() {
    let yaml = MINIMAL.replace("{{ category_id }}", "{{ seller }}");
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("seller"));
}

#[test]
fn test_zero_max_pages_rejected() {
    let yaml = format!("{MINIMAL}    max_pages: 0\n");
    assert!(matches!(
        load_site_from_str(&yaml).unwrap_err(),
        Error::InvalidConfigValue { .. }
    ));
}

#[test]
fn test_listing_without_locator_must_belong_to_profile() {
    let yaml = MINIMAL.replace(
        "    locator: \"{{ base_url }}/category/{{ category_id }}\"\n",
        "",
    );
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("no locator"));
}

#[test]
fn test_profile_unknown_listing_rejected() {
    let yaml = format!(
        "{MINIMAL}profile:\n  locator: \"{{{{ base_url }}}}/@{{{{ seller }}}}\"\n  reviews: missing\n"
    );
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("unknown listing 'missing'"));
}

#[test]
fn test_profile_listing_kind_checked() {
    let yaml = format!(
        "{MINIMAL}profile:\n  locator: \"{{{{ base_url }}}}/@{{{{ seller }}}}\"\n  reviews: services\n"
    );
    let message = config_message(load_site_from_str(&yaml).unwrap_err());
    assert!(message.contains("expected review"));
}

#[test]
fn test_profile_locator_variable_checked() {
    let yaml = format!(
        "{MINIMAL}profile:\n  locator: \"{{{{ base_url }}}}/@{{{{ user }}}}\"\n"
    );
    assert!(load_site_from_str(&yaml).is_err());
}
