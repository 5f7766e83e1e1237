use crate::config::{nodes_for_taxa, Limits};
use crate::error::{PhyloError, PhyloResult};
use crate::phylo::tree::{Edge, EdgeSink};
use crate::phylo::{format_distance, TaxonTable};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, StringRecordsIntoIter, WriterBuilder};
use log::info;
use std::collections::HashSet;
use std::io::{self, Read, Write};

/// Read a distance table: a header line `,A,B,...` followed by one row per
/// taxon, `A,d1,d2,...`. Lines starting with `#` are comments.
///
/// Lines after the last matrix row are not read.
pub fn read_distance_table<R: Read>(reader: R, limits: &Limits) -> PhyloResult<TaxonTable> {
    let mut records = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
        .into_records();

    let (line, header) = next_line(&mut records, None)?.ok_or(PhyloError::MissingHeader)?;
    let names = parse_header(&header, line, limits)?;
    let n = names.len();

    let mut values = Vec::with_capacity(n * n);
    for (row, name) in names.iter().enumerate() {
        let (line, record) =
            next_line(&mut records, Some(&**name))?.ok_or(PhyloError::TruncatedInput {
                expected: n,
                found: row,
            })?;
        check_field_lengths(&record, line, limits)?;

        let found = record.get(0).unwrap_or("");
        if found != &**name {
            return Err(PhyloError::TaxonNameMismatch {
                line,
                expected: name.to_string(),
                found: found.to_string(),
            });
        }

        for (column, field) in record.iter().enumerate().skip(1) {
            let d = parse_distance(field).ok_or_else(|| PhyloError::InvalidNumber {
                line,
                column,
                field: field.to_string(),
            })?;
            values.push(d);
        }
        if record.len() - 1 != n {
            return Err(PhyloError::RowFieldCountMismatch {
                line,
                expected: n,
                found: record.len() - 1,
            });
        }
    }

    check_matrix(&names, &values)?;
    info!("read distances for {n} taxa");
    Ok(TaxonTable::new(names, &values, *limits))
}

/// Next non-comment record with its line number.
///
/// A `#` line counts as data when its first field is `expected`, so that
/// synthesized names like `#5` can be read back.
fn next_line<R: Read>(
    records: &mut StringRecordsIntoIter<R>,
    expected: Option<&str>,
) -> PhyloResult<Option<(u64, StringRecord)>> {
    for result in records {
        let record = result.map_err(|e| PhyloError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            source: e,
        })?;
        let first = record.get(0).unwrap_or("");
        if first.starts_with('#') && expected != Some(first) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        return Ok(Some((line, record)));
    }
    Ok(None)
}

fn check_field_lengths(record: &StringRecord, line: u64, limits: &Limits) -> PhyloResult<()> {
    for field in record.iter() {
        let len = field.len();
        if len > limits.input_max {
            return Err(PhyloError::FieldTooLong {
                line,
                len,
                max: limits.input_max,
            });
        }
    }
    Ok(())
}

fn parse_header(record: &StringRecord, line: u64, limits: &Limits) -> PhyloResult<Vec<Box<str>>> {
    check_field_lengths(record, line, limits)?;
    if record.get(0).is_some_and(|corner| !corner.is_empty()) {
        return Err(PhyloError::MalformedHeader {
            line,
            msg: "first field must be empty",
        });
    }

    let count = record.len().saturating_sub(1);
    if count == 0 {
        return Err(PhyloError::MalformedHeader {
            line,
            msg: "no taxa declared",
        });
    }
    if count > limits.max_taxa {
        return Err(PhyloError::TooManyTaxa {
            line,
            count,
            max: limits.max_taxa,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    for name in record.iter().skip(1) {
        if name.is_empty() {
            return Err(PhyloError::MalformedHeader {
                line,
                msg: "empty taxon name",
            });
        }
        if is_internal_name(name, count) {
            return Err(PhyloError::ReservedTaxonName {
                line,
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(PhyloError::DuplicateTaxon {
                line,
                name: name.to_string(),
            });
        }
        names.push(name.to_string().into_boxed_str());
    }
    Ok(names)
}

/// Whether `name` is `#<id>` for an internal node id of a tree over `taxa`
/// taxa.
fn is_internal_name(name: &str, taxa: usize) -> bool {
    name.strip_prefix('#')
        .filter(|id| id.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|id| id.parse::<usize>().ok())
        .is_some_and(|id| {
            (taxa..nodes_for_taxa(taxa)).contains(&id) && name == format!("#{id}")
        })
}

/// `\d+(\.\d+)?` without redundant leading zeros.
fn parse_distance(field: &str) -> Option<f64> {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let (int, frac) = match field.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (field, None),
    };
    if !digits(int) || (int.len() > 1 && int.starts_with('0')) {
        return None;
    }
    if !frac.map_or(true, digits) {
        return None;
    }
    field.parse().ok()
}

fn check_matrix(names: &[Box<str>], values: &[f64]) -> PhyloResult<()> {
    let n = names.len();
    for i in 0..n {
        let value = values[i * n + i];
        if value != 0.0 {
            return Err(PhyloError::NonZeroDiagonal {
                name: names[i].to_string(),
                value,
            });
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let (ab, ba) = (values[i * n + j], values[j * n + i]);
            if ab != ba {
                return Err(PhyloError::AsymmetricMatrix {
                    a: names[i].to_string(),
                    b: names[j].to_string(),
                    ab,
                    ba,
                });
            }
        }
    }
    Ok(())
}

/// Write the matrix over every node in `table`, internal nodes included, in
/// the format [`read_distance_table`] accepts.
pub fn write_distance_matrix<W: Write>(table: &TaxonTable, writer: W) -> PhyloResult<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);
    let n = table.num_all_nodes();

    let mut header = Vec::with_capacity(n + 1);
    header.push("");
    header.extend(table.names().iter().map(|s| &**s));
    wtr.write_record(&header).map_err(io::Error::from)?;

    let mut row = Vec::with_capacity(n + 1);
    for i in 0..n {
        row.clear();
        row.push(table.name(i).to_string());
        row.extend(table.matrix().row(i).iter().map(|&d| format_distance(d)));
        wtr.write_record(&row).map_err(io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Streams edges as `a,b,length` lines.
pub struct EdgeWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl<W: Write> EdgeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            wtr: WriterBuilder::new()
                .quote_style(QuoteStyle::Never)
                .from_writer(writer),
        }
    }

    pub fn flush(&mut self) -> PhyloResult<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

impl<W: Write> EdgeSink for EdgeWriter<W> {
    fn edge(&mut self, edge: Edge) -> PhyloResult<()> {
        self.wtr
            .write_record([
                edge.a.to_string(),
                edge.b.to_string(),
                format_distance(edge.length),
            ])
            .map_err(io::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phylo::{neighbor_joining, NoEdges};

    fn read(input: &str) -> PhyloResult<TaxonTable> {
        read_distance_table(input.as_bytes(), &Limits::default())
    }

    const FOUR: &str = "\
# additive tree ((A:1,B:1):1,(C:1,D:1):1)
,A,B,C,D
A,0,2,4,4
B,2,0,4,4
C,4,4,0,2
D,4,4,2,0
";

    #[test]
    fn read_basic() {
        let table = read(FOUR).unwrap();
        assert_eq!(table.num_taxa(), 4);
        assert_eq!(table.num_all_nodes(), 4);
        assert_eq!(table.num_active_nodes(), 4);
        assert_eq!(table.name(2), "C");
        assert_eq!(table.distance(0, 2), 4.0);
        assert_eq!(table.active().as_slice(), &[0, 1, 2, 3]);
        assert!(table.nodes().iter().all(|n| n.degree() == 0));
    }

    #[test]
    fn comments_between_rows_and_trailing_lines() {
        let input = ",A,B\n# note\nA,0,1.5\n#another\nB,1.5,0\nthis line is ignored\n";
        let table = read(input).unwrap();
        assert_eq!(table.num_taxa(), 2);
        assert_eq!(table.distance(1, 0), 1.5);
    }

    #[test]
    fn crlf_lines() {
        let table = read(",A,B\r\nA,0,3\r\nB,3,0\r\n").unwrap();
        assert_eq!(table.distance(0, 1), 3.0);
    }

    #[test]
    fn missing_final_newline() {
        let table = read(",A,B\nA,0,3\nB,3,0").unwrap();
        assert_eq!(table.distance(0, 1), 3.0);
    }

    #[test]
    fn field_too_long() {
        let long = "x".repeat(101);
        let err = read(&format!(",{long},B\n")).unwrap_err();
        match err {
            PhyloError::FieldTooLong { len: 101, max: 100, .. } => {}
            other => panic!("expected field too long, got {other:?}"),
        }
    }

    #[test]
    fn field_too_long_in_rows() {
        let long = "x".repeat(101);
        let err = read(&format!(",A,B\nA,0,{long}\nB,1,0\n")).unwrap_err();
        match err {
            PhyloError::FieldTooLong { line: 2, len: 101, .. } => {}
            other => panic!("expected field too long, got {other:?}"),
        }

        let digits = format!("1.{}", "0".repeat(99));
        let err = read(&format!(",A,B\nA,0,1\nB,{digits},0\n")).unwrap_err();
        match err {
            PhyloError::FieldTooLong { line: 3, len: 101, .. } => {}
            other => panic!("expected field too long, got {other:?}"),
        }
    }

    #[test]
    fn field_length_counts_bytes() {
        // 51 two-byte characters
        let name = "\u{e9}".repeat(51);
        match read(&format!(",{name}\n")).unwrap_err() {
            PhyloError::FieldTooLong { len: 102, max: 100, .. } => {}
            other => panic!("expected field too long, got {other:?}"),
        }
    }

    #[test]
    fn field_at_limit_is_accepted() {
        let name = "x".repeat(100);
        let table = read(&format!(",{name}\n{name},0\n")).unwrap();
        assert_eq!(table.name(0), name);
    }

    #[test]
    fn too_many_taxa() {
        let limits = Limits {
            max_taxa: 2,
            ..Limits::default()
        };
        let err = read_distance_table(",A,B,C\n".as_bytes(), &limits).unwrap_err();
        match err {
            PhyloError::TooManyTaxa { count: 3, max: 2, .. } => {}
            other => panic!("expected too many taxa, got {other:?}"),
        }
    }

    #[test]
    fn name_mismatch() {
        let err = read(",A,B\nB,0,1\nA,1,0\n").unwrap_err();
        match err {
            PhyloError::TaxonNameMismatch {
                line: 2,
                expected,
                found,
            } => {
                assert_eq!(expected, "A");
                assert_eq!(found, "B");
            }
            other => panic!("expected name mismatch, got {other:?}"),
        }
    }

    #[test]
    fn two_decimal_points() {
        let err = read(",A,B\nA,0,1.2.3\nB,1,0\n").unwrap_err();
        match err {
            PhyloError::InvalidNumber { column: 2, field, .. } => assert_eq!(field, "1.2.3"),
            other => panic!("expected invalid number, got {other:?}"),
        }
    }

    #[test]
    fn number_grammar() {
        assert_eq!(parse_distance("0"), Some(0.0));
        assert_eq!(parse_distance("10"), Some(10.0));
        assert_eq!(parse_distance("0.25"), Some(0.25));
        assert_eq!(parse_distance("12.50"), Some(12.5));
        for bad in ["", ".5", "5.", "-1", "+1", "1e3", "01", "00.5", " 1", "1,0", "nan"] {
            assert_eq!(parse_distance(bad), None, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn empty_distance_field() {
        let err = read(",A,B\nA,0,\nB,1,0\n").unwrap_err();
        assert!(matches!(err, PhyloError::InvalidNumber { .. }));
    }

    #[test]
    fn short_row() {
        let err = read(",A,B,C\nA,0,1\n").unwrap_err();
        match err {
            PhyloError::RowFieldCountMismatch {
                line: 2,
                expected: 3,
                found: 2,
            } => {}
            other => panic!("expected field count mismatch, got {other:?}"),
        }
    }

    #[test]
    fn long_row() {
        let err = read(",A,B\nA,0,1,2\nB,1,0\n").unwrap_err();
        assert!(matches!(
            err,
            PhyloError::RowFieldCountMismatch { found: 3, .. }
        ));
    }

    #[test]
    fn non_zero_diagonal() {
        let err = read(",A,B\nA,0,1\nB,1,2\n").unwrap_err();
        match err {
            PhyloError::NonZeroDiagonal { name, value } => {
                assert_eq!(name, "B");
                assert_eq!(value, 2.0);
            }
            other => panic!("expected non-zero diagonal, got {other:?}"),
        }
    }

    #[test]
    fn asymmetric() {
        let err = read(",A,B,C\nA,0,1,2\nB,1,0,3\nC,2,4,0\n").unwrap_err();
        match err {
            PhyloError::AsymmetricMatrix { a, b, ab, ba } => {
                assert_eq!((a.as_str(), b.as_str()), ("B", "C"));
                assert_eq!((ab, ba), (3.0, 4.0));
            }
            other => panic!("expected asymmetric matrix, got {other:?}"),
        }
    }

    #[test]
    fn truncated() {
        let err = read(",A,B,C\nA,0,1,2\n# trailing comment\n").unwrap_err();
        match err {
            PhyloError::TruncatedInput {
                expected: 3,
                found: 1,
            } => {}
            other => panic!("expected truncated input, got {other:?}"),
        }
    }

    #[test]
    fn empty_input() {
        for input in ["", "\n", "# only a comment\n"] {
            let err = read(input).unwrap_err();
            assert!(matches!(err, PhyloError::MissingHeader), "{input:?}: {err:?}");
            assert_eq!(err.to_string(), "input ended before the header line");
        }
    }

    #[test]
    fn malformed_headers() {
        for input in ["X,A,B\n", ",\n", ",A,,B\n"] {
            match read(input).unwrap_err() {
                PhyloError::MalformedHeader { line: 1, .. } => {}
                other => panic!("expected malformed header for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_taxon() {
        match read(",A,B,A\n").unwrap_err() {
            PhyloError::DuplicateTaxon { name, .. } => assert_eq!(name, "A"),
            other => panic!("expected duplicate taxon, got {other:?}"),
        }
    }

    #[test]
    fn internal_node_names_are_reserved() {
        // a 4-taxon tree synthesizes #4 and #5
        for name in ["#4", "#5"] {
            let input = format!(",a,b,c,{name}\n");
            match read(&input).unwrap_err() {
                PhyloError::ReservedTaxonName { line: 1, name: found } => assert_eq!(found, name),
                other => panic!("expected reserved name for {name}, got {other:?}"),
            }
        }

        let table = read(",a,b,c,#6\na,0,1,1,1\nb,1,0,1,1\nc,1,1,0,1\n#6,1,1,1,0\n").unwrap();
        assert_eq!(table.name(3), "#6");
        let table = read(",a,b,c,#04\na,0,1,1,1\nb,1,0,1,1\nc,1,1,0,1\n#04,1,1,1,0\n").unwrap();
        assert_eq!(table.name(3), "#04");
    }

    #[test]
    fn hash_named_taxa_build_and_read_back() {
        let mut table = read(",a,b,c,#3\na,0,2,4,4\nb,2,0,4,4\nc,4,4,0,2\n#3,4,4,2,0\n").unwrap();
        neighbor_joining(&mut table, &mut NoEdges).unwrap();
        assert_eq!(table.names().len(), 6);
        let mut out = Vec::new();
        write_distance_matrix(&table, &mut out).unwrap();
        let reread = read_distance_table(out.as_slice(), &Limits::default()).unwrap();
        assert_eq!(reread.num_taxa(), 6);
        assert_eq!(reread.name(4), "#4");
    }

    #[test]
    fn quotes_are_literal() {
        let table = read(",\"A\",B\n\"A\",0,1\nB,1,0\n").unwrap();
        assert_eq!(table.name(0), "\"A\"");
    }

    #[test]
    fn hash_named_row_is_data_when_expected() {
        let table = read(",A,#1\nA,0,2\n#1,2,0\n").unwrap();
        assert_eq!(table.name(1), "#1");
        assert_eq!(table.distance(1, 0), 2.0);
    }

    #[test]
    fn parse_is_idempotent() {
        assert_eq!(read(FOUR).unwrap(), read(FOUR).unwrap());
    }

    #[test]
    fn write_matrix_after_build() {
        let mut table = read(",A,B,C\nA,0,2,4\nB,2,0,4\nC,4,4,0\n").unwrap();
        neighbor_joining(&mut table, &mut NoEdges).unwrap();
        let mut out = Vec::new();
        write_distance_matrix(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",A,B,C,#3");
        assert_eq!(lines[1], "A,0.00,2.00,4.00,1.00");
        assert_eq!(lines[4], "#3,1.00,1.00,3.00,0.00");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn matrix_round_trip() {
        let mut table = read(FOUR).unwrap();
        neighbor_joining(&mut table, &mut NoEdges).unwrap();
        let mut out = Vec::new();
        write_distance_matrix(&table, &mut out).unwrap();

        let reread = read_distance_table(out.as_slice(), &Limits::default()).unwrap();
        let n = table.num_all_nodes();
        assert_eq!(reread.num_taxa(), n);
        assert_eq!(reread.names(), table.names());
        for i in 0..n {
            for j in 0..n {
                let diff = (reread.distance(i, j) - table.distance(i, j)).abs();
                assert!(diff <= 0.005 + 1e-9, "cell ({i},{j}) differs by {diff}");
            }
        }
    }

    #[test]
    fn edge_writer_format() {
        let mut out = Vec::new();
        {
            let mut writer = EdgeWriter::new(&mut out);
            writer
                .edge(Edge {
                    a: 0,
                    b: 3,
                    length: 1.0 / 3.0,
                })
                .unwrap();
            writer
                .edge(Edge {
                    a: 1,
                    b: 3,
                    length: -0.001,
                })
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "0,3,0.33\n1,3,0.00\n");
    }
}
