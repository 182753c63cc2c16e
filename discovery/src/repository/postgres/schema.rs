//! DDL for the `patents` schema.
//!
//! Every statement may be run repeatedly. The `citation_count` and `cited_by_count`
//! columns of `patents.patents` are kept current by a trigger on `patents.citations`.

pub const CREATE_SCHEMA_SQL: &str = "CREATE SCHEMA IF NOT EXISTS patents;";

pub const CREATE_PATENTS_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS patents.patents (
        id              SERIAL PRIMARY KEY,
        patent_number   VARCHAR(20) NOT NULL UNIQUE,
        title           TEXT NOT NULL,
        abstract        TEXT,
        filing_date     DATE,
        grant_date      DATE,
        assignee_name   TEXT,
        inventor_names  TEXT,
        raw_data        JSONB,
        citation_count  INTEGER NOT NULL DEFAULT 0,
        cited_by_count  INTEGER NOT NULL DEFAULT 0,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
";

pub const CREATE_CLAIMS_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS patents.claims (
        id              SERIAL PRIMARY KEY,
        patent_id       INTEGER NOT NULL REFERENCES patents.patents(id) ON DELETE CASCADE,
        claim_number    INTEGER NOT NULL,
        claim_text      TEXT NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (patent_id, claim_number)
    );
";

pub const CREATE_CITATIONS_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS patents.citations (
        id                      SERIAL PRIMARY KEY,
        citing_patent_number    VARCHAR(20) NOT NULL,
        cited_patent_number     VARCHAR(20) NOT NULL,
        citation_type           VARCHAR(10) NOT NULL
                                CHECK (citation_type IN ('forward', 'backward')),
        created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (citing_patent_number, cited_patent_number)
    );
";

pub const CREATE_INDEXES_SQL: &str = r"
    CREATE INDEX IF NOT EXISTS idx_patents_title ON patents.patents (LOWER(title));
    CREATE INDEX IF NOT EXISTS idx_patents_grant_date ON patents.patents (grant_date);
    CREATE INDEX IF NOT EXISTS idx_patents_assignee ON patents.patents (assignee_name);
    CREATE INDEX IF NOT EXISTS idx_claims_patent_id ON patents.claims (patent_id);
    CREATE INDEX IF NOT EXISTS idx_citations_citing ON patents.citations (citing_patent_number);
    CREATE INDEX IF NOT EXISTS idx_citations_cited ON patents.citations (cited_patent_number);
";

/// Maintains the denormalised citation counters of both ends of a citation
pub const CREATE_CITATION_COUNT_TRIGGER_SQL: &str = r"
    CREATE OR REPLACE FUNCTION patents.update_citation_counts() RETURNS TRIGGER AS $$
    BEGIN
        IF TG_OP = 'INSERT' THEN
            UPDATE patents.patents SET citation_count = citation_count + 1
                WHERE patent_number = NEW.citing_patent_number;
            UPDATE patents.patents SET cited_by_count = cited_by_count + 1
                WHERE patent_number = NEW.cited_patent_number;
            RETURN NEW;
        ELSIF TG_OP = 'DELETE' THEN
            UPDATE patents.patents SET citation_count = GREATEST(citation_count - 1, 0)
                WHERE patent_number = OLD.citing_patent_number;
            UPDATE patents.patents SET cited_by_count = GREATEST(cited_by_count - 1, 0)
                WHERE patent_number = OLD.cited_patent_number;
            RETURN OLD;
        END IF;
        RETURN NULL;
    END;
    $$ LANGUAGE plpgsql;

    DROP TRIGGER IF EXISTS trg_citation_counts ON patents.citations;
    CREATE TRIGGER trg_citation_counts
        AFTER INSERT OR DELETE ON patents.citations
        FOR EACH ROW EXECUTE FUNCTION patents.update_citation_counts();
";

pub const CREATE_UPDATED_AT_TRIGGER_SQL: &str = r"
    CREATE OR REPLACE FUNCTION patents.touch_updated_at() RETURNS TRIGGER AS $$
    BEGIN
        NEW.updated_at = NOW();
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql;

    DROP TRIGGER IF EXISTS trg_patents_updated_at ON patents.patents;
    CREATE TRIGGER trg_patents_updated_at
        BEFORE UPDATE ON patents.patents
        FOR EACH ROW EXECUTE FUNCTION patents.touch_updated_at();
";

/// In dependency order
pub const SCHEMA_STATEMENTS: [&str; 7] = [
    CREATE_SCHEMA_SQL,
    CREATE_PATENTS_TABLE_SQL,
    CREATE_CLAIMS_TABLE_SQL,
    CREATE_CITATIONS_TABLE_SQL,
    CREATE_INDEXES_SQL,
    CREATE_CITATION_COUNT_TRIGGER_SQL,
    CREATE_UPDATED_AT_TRIGGER_SQL,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for statement in SCHEMA_STATEMENTS {
            for line in statement.lines().map(str::trim) {
                if line.starts_with("CREATE TABLE")
                    || line.starts_with("CREATE INDEX")
                    || line.starts_with("CREATE SCHEMA")
                {
                    assert!(line.contains("IF NOT EXISTS"), "{line}");
                }
                if line.starts_with("CREATE TRIGGER") {
                    assert!(statement.contains("DROP TRIGGER IF EXISTS"), "{line}");
                }
                if line.starts_with("CREATE FUNCTION") {
                    panic!("functions must be created with CREATE OR REPLACE: {line}");
                }
            }
        }
    }

    #[test]
    fn tables_are_created_before_dependents() {
        let position = |needle: &str| {
            SCHEMA_STATEMENTS
                .iter()
                .position(|s| s.contains(needle))
                .unwrap()
        };
        assert!(position("CREATE SCHEMA") < position("patents.patents ("));
        assert!(position("patents.patents (") < position("patents.claims ("));
        assert!(position("patents.citations (") < position("trg_citation_counts"));
    }
}
