use serde_json::{json, Value};

pub const PATENT_ENDPOINT: &str = "/api/v1/patent/";
pub const TEST_IDEA: &str = "A rechargeable battery pack with solar charging cells";

/// A patent record the way PatentsView returns it
pub fn raw_patent(number: &str, title: &str, date: &str, cites: &[&str]) -> Value {
    let cited: Vec<Value> = cites
        .iter()
        .map(|n| json!({"cited_patent_number": n}))
        .collect();
    json!({
        "patent_number": number,
        "patent_title": title,
        "patent_abstract": format!("Abstract of {title}"),
        "patent_date": date,
        "app_date": "2018-06-20",
        "assignees": [{"assignee_organization": "Example Corp"}],
        "inventors": [{"inventor_name_first": "John", "inventor_name_last": "Doe"}],
        "claims": [
            {"claim_number": 1, "claim_text": "A battery comprising..."},
            {"claim_number": 2, "claim_text": "The battery of claim 1..."}
        ],
        "cited_patents": cited,
        "citedby_patents": []
    })
}

pub fn page(patents: &[Value], total_pages: u32) -> String {
    json!({
        "patents": patents,
        "count": patents.len(),
        "total_hits": patents.len(),
        "total_pages": total_pages,
    })
    .to_string()
}

/// Three patents, 10000003 cites 10000002 which cites 10000001
pub fn citation_chain() -> Vec<Value> {
    vec![
        raw_patent("10000001", "Solar battery cell", "2019-04-02", &[]),
        raw_patent("10000002", "Battery pack charger", "2021-08-17", &["10000001"]),
        raw_patent(
            "10000003",
            "Rechargeable solar battery pack",
            "2023-01-10",
            &["10000002", "10000001"],
        ),
    ]
}
