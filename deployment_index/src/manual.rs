/*!

This is the long-form manual for `deployment_index` and the `mdi` program.

## Input datasets

Three static datasets are loaded once at startup. Each one is described in the
configuration file by a `provider` (`xlsx` or `csv`), a `filePath` relative to
the configuration file, and for Excel files an optional `worksheetName` (the
first worksheet is used otherwise). Columns are found by their header name, in
any order.

### Deployments

One row per (country, year, mission):

| Country | Year | Theatre     | Organisation | MissionName | MissionType      | Deployed | Lat  | Lon  |
|---------|------|-------------|--------------|-------------|------------------|----------|------|------|
| USA     | 2021 | Middle East | NATO         | Op A        | Operation        | 600      | 33.3 | 44.4 |
| USA     | 2021 | Asia        | USA          | Japan       | MilitaryPresence | 5000     |      |      |

`Lat` and `Lon` are optional. Only the `Operation` rows enter the metrics and
the index; `MilitaryPresence` rows are the marker layer of the map.

The years of this dataset are the years that can be selected.

### Population

Wide format: one row per country and one column per year. The header of a
year column is the year itself.

```text
Country,2019,2020,2021
USA,328300000,331500000,331900000
```

Empty cells are missing values.

### Active duty personnel

```text
Country,Year,Personnel_Count
USA,2021,1388000
```

## Derived metrics

For a selection of countries and a year:
* total deployment of the selection
* deployment per 100 000 inhabitants, per country
* deployment as a percent of the active duty personnel, per country. This value
  is not bounded by 100.
* the dominant theatre (largest deployment, ties by name) and its share
* deployment by organisation, the 5 largest and "Other"
* deployment by organisation and mission

A ratio with a denominator of zero is 0. A missing population or personnel row
only invalidates the ratio that needs it.

## Military Deployment Index

The index of a year is computed over every country with operations and a
population that year, independently of the selection:

1. total deployment `T` and deployment per capita `P` of every country
2. z-scores of `T` and of `P` (population standard deviation)
3. combined score `z(T) + z(P)`, or a weighted average of the two
4. linear rescaling of the combined scores to 0–100, rounded to an integer

A year with fewer than two countries, or in which all the countries have the
same `T`, `P` or combined score, has no index. With a weighted combination, a
quantity of weight 0 is ignored. The index ranks countries within
one year. Values of different years are not comparable.

## Configuration

```json
{
  "dataSources": {
    "deployments": { "provider": "xlsx", "filePath": "MDVA_Deployments_LatLon.xlsx" },
    "population": { "provider": "csv", "filePath": "MDVA_Population.csv" },
    "activeDuty": { "provider": "xlsx", "filePath": "MDVA_ActiveDuty.xlsx", "worksheetName": "Sheet1" }
  },
  "rules": { "topN": 5, "combination": "sum" },
  "defaultYear": 2021
}
```

`rules` and `defaultYear` are optional. `topN` is a number or a string.
`combination` is `sum` (default) or `weighted`, in which case `weights` must
give the weight of the totals and of the per capita values:
`"weights": { "total": 2, "perCapita": 1 }`.

## Command line

```bash
mdi dashboard -c config.json --countries USA,DEU --year 2021 --out summary.json
mdi dashboard -c config.json --group nato
mdi dashboard -c config.json --countries-file country_list.csv --reference expected.json
mdi precompute -c config.json --out-dir tables/
mdi export-countries --group eu --out country_list.csv
```

A country list file is a CSV file with a `countries` column. Unknown codes are
reported and left out of the selection.

 */
