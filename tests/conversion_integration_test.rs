use danmaku_processor::{
    AssRenderOptions, AssRenderOptionsBuilder, CommentMode, generate_ass, parse_acfun,
    parse_bilibili,
};

const BILIBILI_FEED: &str = include_str!("test_data/bilibili_comments.xml");
const ACFUN_FEED: &str = include_str!("test_data/acfun_comments.json");

fn options_1280x720() -> AssRenderOptions {
    AssRenderOptionsBuilder::default()
        .width(1280_u32)
        .height(720_u32)
        .style_name("TestStyle".to_string())
        .build()
        .unwrap()
}

fn dialogue_count(document: &str) -> usize {
    document
        .lines()
        .filter(|line| line.starts_with("Dialogue:"))
        .count()
}

#[test]
fn test_bilibili_feed_produces_expected_comment_set() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    // 13 条弹幕里有一条脚本弹幕和一条损坏的参数表
    assert_eq!(comments.len(), 11);
    assert_eq!(comments[0].text, "前方高能预警");
    assert!(
        comments
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp),
        "输出应当按时间升序"
    );
    assert!(
        comments
            .iter()
            .any(|c| matches!(c.mode, CommentMode::Positioned(_))),
        "定位弹幕应当保留"
    );
    assert_eq!(comments.last().unwrap().text, "CDATA 里的 <标签>");
}

#[test]
fn test_bilibili_document_structure() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let document = generate_ass(&comments, &options_1280x720()).unwrap();

    assert!(document.starts_with('\u{FEFF}'), "文档应当以 BOM 开头");
    assert!(document.contains("[Script Info]"));
    assert!(document.contains("PlayResX: 1280"));
    assert!(document.contains("PlayResY: 720"));
    assert!(document.contains("Style: TestStyle, sans-serif, 25,"));
    assert!(document.contains("[Events]"));
    assert_eq!(dialogue_count(&document), 11);
}

#[test]
fn test_simultaneous_scrolls_occupy_distinct_rows() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let document = generate_ass(&comments, &options_1280x720()).unwrap();

    let rows: Vec<&str> = document
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("\\move(1280, ")?;
            rest.split_once(',').map(|(row, _)| row)
        })
        .collect();
    assert!(rows.len() >= 3);
    assert_ne!(rows[0], rows[1]);
    assert_ne!(rows[0], rows[2]);
    assert_ne!(rows[1], rows[2]);
}

#[test]
fn test_positioned_comment_renders_static_pos() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let document = generate_ass(&comments, &options_1280x720()).unwrap();

    // 起止点相同，应当用 \pos 而不是 \move
    assert!(document.contains("\\org(640, 360)\\pos(614, 296)"));
    assert!(!document.contains("\\move(614,"));
    assert!(document.contains("\\fn黑体"));
    assert!(document.contains("\\fs59"));
    assert!(document.contains("\\fade(0, 127, 127, 0, 4500, 4500, 4500)"));
    assert!(document.contains("Dialogue: -1,0:00:12.00,0:00:16.50,TestStyle,"));
}

#[test]
fn test_special_characters_are_escaped() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let document = generate_ass(&comments, &options_1280x720()).unwrap();

    assert!(document.contains(r"\{\\\}&<>"), "花括号和反斜杠应当转义");
    assert!(document.contains("第一行\\N第二行更长一些"));
}

#[test]
fn test_filters_drop_matching_lane_comments_only() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();

    let filtered = AssRenderOptionsBuilder::default()
        .width(1280_u32)
        .height(720_u32)
        .filters(vec!["剧透".to_string()])
        .build()
        .unwrap();
    let document = generate_ass(&comments, &filtered).unwrap();
    assert_eq!(dialogue_count(&document), 10);
    assert!(!document.contains("小字号剧透内容"));

    // 屏蔽规则不作用于定位弹幕
    let positioned_filter = AssRenderOptionsBuilder::default()
        .width(1280_u32)
        .height(720_u32)
        .filters(vec!["定位".to_string()])
        .build()
        .unwrap();
    let document = generate_ass(&comments, &positioned_filter).unwrap();
    assert_eq!(dialogue_count(&document), 11);
}

#[test]
fn test_reduction_drops_comments_when_rows_exhausted() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let cramped = AssRenderOptionsBuilder::default()
        .width(848_u32)
        .height(60_u32)
        .reduce_comments(true)
        .build()
        .unwrap();
    let document = generate_ass(&comments, &cramped).unwrap();

    // 60 像素高的画布放不下第三条同时出现的滚动弹幕
    assert_eq!(dialogue_count(&document), 10);
    assert!(document.contains("同一时刻的第二条"));
    assert!(!document.contains("同一时刻的第三条"));
}

#[test]
fn test_acfun_feed_converts_end_to_end() {
    let comments = parse_acfun(ACFUN_FEED, 25.0).unwrap();
    assert_eq!(comments.len(), 7);

    let document = generate_ass(&comments, &options_1280x720()).unwrap();
    assert!(document.contains("多行\\N文本"));
    assert!(document.contains(
        "Dialogue: -1,0:00:09.00,0:00:13.00,TestStyle,,0,0,0,,\
         {\\org(640, 360)\\an5\\fs54\\pos(640, 360)\
         \\frx0\\fry0\\frz0\\fscx100\\fscy100\\c&HF40002&\\alpha&H33}高级弹幕"
    ));
    assert!(document.contains("\\move(640, 360, 136, 0)\\t("));
    assert!(document.contains("0:00:13.00,0:00:15.00"));
}

#[test]
fn test_acfun_structure_errors_are_fatal() {
    assert!(parse_acfun("[]", 25.0).is_err());
    assert!(parse_acfun("{\"c\": []}", 25.0).is_err());
    assert!(parse_acfun("不是 JSON", 25.0).is_err());
}

#[test]
fn test_identical_inputs_produce_identical_documents() {
    let comments = parse_bilibili(BILIBILI_FEED, 25.0).unwrap();
    let options = options_1280x720();
    let first = generate_ass(&comments, &options).unwrap();
    let second = generate_ass(&comments, &options).unwrap();
    assert_eq!(first, second);
}
